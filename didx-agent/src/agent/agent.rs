use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::{debug, info};

use didx_core::agent::{
    AgentConfig, AgentError, Dispatcher, InboundMessageContext, OutboundMessage,
};
use didx_core::modules::credentials::coordinator::CredentialResponseCoordinator;
use didx_core::modules::credentials::handlers::{
    CredentialAckHandler, IssueCredentialHandler, OfferCredentialHandler,
    ProposeCredentialHandler, RequestCredentialHandler,
};
use didx_core::modules::credentials::v1::V1CredentialService;
use didx_core::modules::credentials::v2::V2CredentialService;
use didx_core::modules::credentials::{CredentialService, CredentialStorage, CredentialsApi};
use didx_core::modules::proofs::handlers::{
    PresentationAckHandler, PresentationHandler, ProposePresentationHandler,
    RequestPresentationHandler,
};
use didx_core::modules::proofs::v1::V1ProofService;
use didx_core::modules::proofs::{ProofResponseCoordinator, ProofStorage};
use didx_core::modules::routing::{MediationRecord, MediationRepository};
use didx_core::storage::StorageService;
use didx_core::transport::{EncryptedMessage, InboundMessageReceiver, OutboundTransport};
use didx_core::wallet::{CredentialWallet, ProofWallet};

use super::EnvelopeService;

/// `AgentStorage` is a store able to keep every record kind the agent works with
pub trait AgentStorage: CredentialStorage + ProofStorage + StorageService<MediationRecord> {}

impl<T> AgentStorage for T where
    T: CredentialStorage + ProofStorage + StorageService<MediationRecord>
{
}

/// `Agent` owns the protocol services of one identity and is the entry point of every
/// inbound envelope
///
/// Replies decided by the message handlers are packed and delivered right away through
/// the outbound transport.
pub struct Agent<TStorage: AgentStorage> {
    config: AgentConfig,
    dispatcher: Dispatcher,
    credentials: CredentialsApi<TStorage>,
    proofs: Arc<V1ProofService<TStorage>>,
    mediation: MediationRepository<TStorage>,
    envelope: Arc<dyn EnvelopeService>,
    transport: Arc<dyn OutboundTransport>,
}

impl<TStorage: AgentStorage> Agent<TStorage> {
    pub fn new<TWallet>(
        config: AgentConfig,
        storage: TStorage,
        wallet: Arc<TWallet>,
        envelope: Arc<dyn EnvelopeService>,
        transport: Arc<dyn OutboundTransport>,
    ) -> Self
    where
        TWallet: CredentialWallet + ProofWallet + 'static,
    {
        let credential_wallet: Arc<dyn CredentialWallet> = wallet.clone();
        let proof_wallet: Arc<dyn ProofWallet> = wallet;

        let credentials_v1 = Arc::new(V1CredentialService::new(
            storage.clone(),
            credential_wallet.clone(),
        ));
        let credentials_v2 = Arc::new(V2CredentialService::new(
            storage.clone(),
            credential_wallet,
        ));
        let proofs = Arc::new(V1ProofService::new(storage.clone(), proof_wallet));

        let credential_coordinator = CredentialResponseCoordinator::new(&config);
        let proof_coordinator = ProofResponseCoordinator::new(&config);

        let mut dispatcher = Dispatcher::new();
        register_credential_handlers(
            &mut dispatcher,
            credentials_v1.clone(),
            credential_coordinator,
        );
        register_credential_handlers(
            &mut dispatcher,
            credentials_v2.clone(),
            credential_coordinator,
        );
        dispatcher
            .register(Arc::new(ProposePresentationHandler::new(
                proofs.clone(),
                proof_coordinator,
            )))
            .register(Arc::new(RequestPresentationHandler::new(
                proofs.clone(),
                proof_coordinator,
            )))
            .register(Arc::new(PresentationHandler::new(
                proofs.clone(),
                proof_coordinator,
            )))
            .register(Arc::new(PresentationAckHandler::new(proofs.clone())));

        Self {
            config,
            dispatcher,
            credentials: CredentialsApi::new(storage.clone(), credentials_v1, credentials_v2),
            proofs,
            mediation: MediationRepository::new(storage),
            envelope,
            transport,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialsApi<TStorage> {
        &self.credentials
    }

    pub fn proofs(&self) -> Arc<V1ProofService<TStorage>> {
        self.proofs.clone()
    }

    pub fn mediation(&self) -> &MediationRepository<TStorage> {
        &self.mediation
    }

    pub fn supported_message_types(&self) -> Vec<&'static str> {
        self.dispatcher.supported_message_types()
    }

    /// `start` hands the agent to the outbound transport so envelopes returned on an
    /// outbound connection come back in through [`InboundMessageReceiver`]
    pub async fn start(self: &Arc<Self>) -> Result<(), AgentError> {
        let receiver: Arc<dyn InboundMessageReceiver> = self.clone();
        self.transport.start(receiver).await?;

        info!(
            "[agent:start] label: {} | message types: {}",
            self.config.label(),
            self.supported_message_types().len()
        );
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), AgentError> {
        self.transport.stop().await?;

        info!("[agent:stop] label: {}", self.config.label());
        Ok(())
    }

    pub async fn send_message(&self, message: OutboundMessage) -> Result<(), AgentError> {
        debug!(
            "[agent:outbound] type: {} | thread: {} | connection: {:?}",
            message.message_type, message.thread_id, message.connection_id
        );

        let package = self.envelope.pack(&message).await?;
        self.transport.send_message(package).await?;
        Ok(())
    }

    pub async fn process_message(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<(), AgentError> {
        debug!(
            "[agent:inbound] type: {:?} | connection: {:?}",
            ctx.message_type(),
            ctx.connection_id
        );

        match self.dispatcher.dispatch(ctx).await? {
            Some(reply) => self.send_message(reply).await,
            None => Ok(()),
        }
    }
}

fn register_credential_handlers<TService>(
    dispatcher: &mut Dispatcher,
    service: Arc<TService>,
    coordinator: CredentialResponseCoordinator,
) where
    TService: CredentialService + 'static,
{
    dispatcher
        .register(Arc::new(ProposeCredentialHandler::new(
            service.clone(),
            coordinator,
        )))
        .register(Arc::new(OfferCredentialHandler::new(
            service.clone(),
            coordinator,
        )))
        .register(Arc::new(RequestCredentialHandler::new(
            service.clone(),
            coordinator,
        )))
        .register(Arc::new(IssueCredentialHandler::new(
            service.clone(),
            coordinator,
        )))
        .register(Arc::new(CredentialAckHandler::new(service)));
}

#[async_trait]
impl<TStorage: AgentStorage> InboundMessageReceiver for Agent<TStorage> {
    async fn receive_message(&self, message: EncryptedMessage) -> Result<(), AgentError> {
        let decrypted = self.envelope.unpack(message).await?;
        self.process_message(decrypted.into_context()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use didx_core::modules::credentials::options::ProposeCredentialOptions;
    use didx_core::modules::credentials::types::{
        AutoAcceptCredential, CredentialFormat, CredentialPreviewAttribute,
        CredentialProtocolVersion, CredentialState, IndyCredentialFormat,
    };
    use didx_core::modules::proofs::options::RequestProofOptions;
    use didx_core::modules::proofs::types::{
        AutoAcceptProof, PresentationPreview, PresentationPreviewAttribute, ProofState,
    };
    use didx_core::modules::proofs::ProofService;
    use didx_core::modules::routing::{MediationRole, MediationState};
    use didx_core::storage::{InMemoryStorage, Record};

    use crate::agent::fakes::{FakeEnvelope, FakeWallet, LoopbackTransport};

    type TestAgent = Agent<InMemoryStorage>;

    async fn generate_agent(
        label: &str,
        connection_id: &str,
    ) -> (Arc<TestAgent>, Arc<LoopbackTransport>) {
        let config = AgentConfig::new(label)
            .with_auto_accept_credentials(AutoAcceptCredential::Always)
            .with_auto_accept_proofs(AutoAcceptProof::Always);

        let transport = Arc::new(LoopbackTransport::default());
        let agent = Arc::new(Agent::new(
            config,
            InMemoryStorage::new(),
            Arc::new(FakeWallet),
            Arc::new(FakeEnvelope::new(connection_id)),
            transport.clone(),
        ));

        agent.start().await.unwrap();
        (agent, transport)
    }

    async fn generate_peers() -> (Arc<TestAgent>, Arc<TestAgent>) {
        let (holder, holder_transport) = generate_agent("holder", "conn-holder").await;
        let (issuer, issuer_transport) = generate_agent("issuer", "conn-issuer").await;

        holder_transport.connect(issuer.clone()).await;
        issuer_transport.connect(holder.clone()).await;
        (holder, issuer)
    }

    #[tokio::test]
    async fn test_registers_every_protocol_handler() {
        let (agent, _) = generate_agent("agent", "conn-1").await;
        let types = agent.supported_message_types();

        assert_eq!(types.len(), 14);
        assert!(types.contains(&"https://didcomm.org/issue-credential/1.0/propose-credential"));
        assert!(types.contains(&"https://didcomm.org/issue-credential/2.0/propose-credential"));
        assert!(types.contains(&"https://didcomm.org/present-proof/1.0/request-presentation"))
    }

    #[tokio::test]
    async fn test_credential_exchange_between_agents() {
        let (holder, issuer) = generate_peers().await;

        let options = ProposeCredentialOptions::new(
            "conn-holder",
            CredentialProtocolVersion::V1,
            CredentialFormat::Indy(IndyCredentialFormat {
                credential_definition_id: Some("cred-def-1".to_string()),
                schema_id: None,
                attributes: vec![CredentialPreviewAttribute::new("name", "alice")],
            }),
        );

        let proposal = holder.credentials().propose_credential(options).await.unwrap();
        let holder_record_id = proposal.record.id();
        holder.send_message(proposal.message).await.unwrap();

        let holder_record = holder
            .credentials()
            .get_by_id(holder_record_id)
            .await
            .unwrap();
        assert_eq!(holder_record.state(), CredentialState::Done);
        assert_eq!(
            holder_record.credential_id(),
            Some("stored-indy-credential".to_string())
        );

        let issuer_records = issuer.credentials().get_all().await.unwrap();
        assert_eq!(issuer_records.len(), 1);
        assert_eq!(issuer_records[0].state(), CredentialState::Done);
        assert_eq!(issuer_records[0].thread_id(), holder_record.thread_id())
    }

    #[tokio::test]
    async fn test_proof_exchange_between_agents() {
        let (prover, verifier) = generate_peers().await;

        let preview = PresentationPreview::new(
            vec![PresentationPreviewAttribute::new("name", None)],
            Vec::new(),
        );
        let request = verifier
            .proofs()
            .create_request(RequestProofOptions::new(
                "conn-issuer",
                preview.to_proof_request("proof-request", "1.0"),
            ))
            .await
            .unwrap()
            .into_outbound()
            .unwrap();
        let verifier_record_id = request.record.id();

        verifier.send_message(request.message).await.unwrap();

        let verifier_record = verifier
            .proofs()
            .get_by_id(verifier_record_id)
            .await
            .unwrap();
        assert_eq!(verifier_record.state(), ProofState::Done);
        assert_eq!(verifier_record.is_verified(), Some(true));

        let prover_records = prover.proofs().exchange().proofs().get_all().await.unwrap();
        assert_eq!(prover_records.len(), 1);
        assert_eq!(prover_records[0].state(), ProofState::Done)
    }

    #[tokio::test]
    async fn test_receive_undecodable_envelope() {
        let (agent, transport) = generate_agent("agent", "conn-1").await;

        let envelope = EncryptedMessage {
            protected: "fake".to_string(),
            iv: "iv".to_string(),
            ciphertext: "not json".to_string(),
            tag: "tag".to_string(),
        };

        let result = agent.receive_message(envelope).await;
        assert!(matches!(result, Err(AgentError::EnvelopeError(_))));
        assert!(transport.sent.lock().await.is_empty())
    }

    #[tokio::test]
    async fn test_receive_unsupported_message() {
        let (agent, transport) = generate_agent("agent", "conn-1").await;

        let message = json!({
            "@type": "https://didcomm.org/trust-ping/1.0/ping",
            "@id": "ping-1"
        });
        let result = agent
            .process_message(InboundMessageContext::new(message, Some("conn-1".to_string())))
            .await;

        assert!(matches!(
            result,
            Err(AgentError::UnsupportedMessageType(_))
        ));
        assert!(transport.sent.lock().await.is_empty())
    }

    #[tokio::test]
    async fn test_stop_disconnects_transport() {
        let (holder, issuer) = generate_peers().await;
        holder.stop().await.unwrap();

        let options = ProposeCredentialOptions::new(
            "conn-holder",
            CredentialProtocolVersion::V1,
            CredentialFormat::Indy(IndyCredentialFormat {
                credential_definition_id: Some("cred-def-1".to_string()),
                schema_id: None,
                attributes: vec![CredentialPreviewAttribute::new("name", "alice")],
            }),
        );
        let proposal = holder.credentials().propose_credential(options).await.unwrap();
        holder.send_message(proposal.message).await.unwrap();

        assert!(issuer.credentials().get_all().await.unwrap().is_empty())
    }

    #[tokio::test]
    async fn test_mediation_records() {
        let (agent, _) = generate_agent("agent", "conn-1").await;

        let mut record = MediationRecord::new(
            MediationState::Granted,
            MediationRole::Recipient,
            "conn-mediator",
            "thread-1",
        );
        record.add_recipient_key("recipient-key");
        record.set_default(true);
        agent.mediation().save(&record).await.unwrap();

        let found = agent
            .mediation()
            .get_single_by_recipient_key("recipient-key")
            .await
            .unwrap();
        assert_eq!(found.id(), record.id());
        assert!(found.assert_ready().is_ok());

        let default = agent.mediation().find_default().await.unwrap();
        assert_eq!(default.map(|found| found.id()), Some(record.id()))
    }
}
