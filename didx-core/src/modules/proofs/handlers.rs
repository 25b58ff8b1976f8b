use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::info;

use crate::agent::context::{InboundMessageContext, OutboundMessage};
use crate::agent::handler::Handler;
use crate::agent::message::AgentMessage;
use crate::agent::types::AgentError;
use crate::storage::types::Record;

use super::coordinator::ProofResponseCoordinator;
use super::options::{AcceptProofProposalOptions, PresentationOptions};
use super::record::ProofExchangeRecord;
use super::service::ProofService;
use super::types::ProofProtocolMsgReturn;

fn reply<TMessage: AgentMessage>(
    result: ProofProtocolMsgReturn<TMessage>,
) -> Result<Option<OutboundMessage>, AgentError> {
    let outbound = result.into_outbound()?;
    info!(
        "[proofs:handler] auto reply: {} | record: {}",
        outbound.message.message_type,
        outbound.record.id()
    );

    Ok(Some(outbound.message))
}

fn processed(step: &str, record: &ProofExchangeRecord) {
    info!(
        "[proofs:handler] {} processed | record: {} | state: {}",
        step,
        record.id(),
        record.state()
    );
}

pub struct ProposePresentationHandler<TService: ProofService> {
    service: Arc<TService>,
    coordinator: ProofResponseCoordinator,
}

impl<TService: ProofService> ProposePresentationHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: ProofResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: ProofService + 'static> Handler for ProposePresentationHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::ProposeMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_proposal(ctx.into_typed()?).await?;
        processed("proposal", &record);

        let previews = self.service.find_previews(&record).await?;
        if !self
            .coordinator
            .should_auto_respond_to_proposal(&record, &previews)
        {
            return Ok(None);
        }

        let result = self
            .service
            .accept_proposal(AcceptProofProposalOptions::new(&record.id()))
            .await?;
        reply(result)
    }
}

pub struct RequestPresentationHandler<TService: ProofService> {
    service: Arc<TService>,
    coordinator: ProofResponseCoordinator,
}

impl<TService: ProofService> RequestPresentationHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: ProofResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: ProofService + 'static> Handler for RequestPresentationHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::RequestMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_request(ctx.into_typed()?).await?;
        processed("request", &record);

        let previews = self.service.find_previews(&record).await?;
        if !self
            .coordinator
            .should_auto_respond_to_request(&record, &previews)
        {
            return Ok(None);
        }

        let result = self
            .service
            .create_presentation(record, PresentationOptions::default())
            .await?;
        reply(result)
    }
}

pub struct PresentationHandler<TService: ProofService> {
    service: Arc<TService>,
    coordinator: ProofResponseCoordinator,
}

impl<TService: ProofService> PresentationHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: ProofResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: ProofService + 'static> Handler for PresentationHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::PresentationMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_presentation(ctx.into_typed()?).await?;
        processed("presentation", &record);

        if !self.coordinator.should_auto_respond_to_presentation(&record) {
            return Ok(None);
        }

        let result = self.service.create_ack(record).await?;
        reply(result)
    }
}

pub struct PresentationAckHandler<TService: ProofService> {
    service: Arc<TService>,
}

impl<TService: ProofService> PresentationAckHandler<TService> {
    pub fn new(service: Arc<TService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<TService: ProofService + 'static> Handler for PresentationAckHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::AckMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_ack(ctx.into_typed()?).await?;
        processed("ack", &record);

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use crate::agent::config::AgentConfig;
    use crate::agent::handler::Dispatcher;
    use crate::modules::proofs::options::RequestProofOptions;
    use crate::modules::proofs::types::{
        AutoAcceptProof, PresentationPreview, PresentationPreviewAttribute, ProofState,
    };
    use crate::modules::proofs::v1::V1ProofService;
    use crate::storage::memory::InMemoryStorage;
    use crate::wallet::fake::FakeWallet;

    type Service = V1ProofService<InMemoryStorage>;

    fn generate_service() -> Arc<Service> {
        Arc::new(V1ProofService::new(
            InMemoryStorage::new(),
            Arc::new(FakeWallet::new(true)),
        ))
    }

    fn generate_dispatcher(service: Arc<Service>, auto_accept: AutoAcceptProof) -> Dispatcher {
        let coordinator = ProofResponseCoordinator::new(
            &AgentConfig::default().with_auto_accept_proofs(auto_accept),
        );

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(Arc::new(ProposePresentationHandler::new(
                service.clone(),
                coordinator,
            )))
            .register(Arc::new(RequestPresentationHandler::new(
                service.clone(),
                coordinator,
            )))
            .register(Arc::new(PresentationHandler::new(
                service.clone(),
                coordinator,
            )))
            .register(Arc::new(PresentationAckHandler::new(service)));

        dispatcher
    }

    #[tokio::test]
    async fn test_always_completes_request_first_flow() {
        let prover = generate_service();
        let verifier = generate_service();
        let prover_dispatcher = generate_dispatcher(prover.clone(), AutoAcceptProof::Always);
        let verifier_dispatcher = generate_dispatcher(verifier.clone(), AutoAcceptProof::Always);

        let preview = PresentationPreview::new(
            vec![PresentationPreviewAttribute::new("name", None)],
            Vec::new(),
        );
        let request = verifier
            .create_request(RequestProofOptions::new(
                "conn-verifier",
                preview.to_proof_request("proof-request", "1.0"),
            ))
            .await
            .unwrap();
        let verifier_record_id = request.record.id();

        let presentation = prover_dispatcher
            .dispatch(InboundMessageContext::new(
                request.into_outbound().unwrap().message.payload,
                Some("conn-prover".to_string()),
            ))
            .await
            .unwrap()
            .unwrap();

        let ack = verifier_dispatcher
            .dispatch(InboundMessageContext::new(
                presentation.payload,
                Some("conn-verifier".to_string()),
            ))
            .await
            .unwrap()
            .unwrap();

        let last = prover_dispatcher
            .dispatch(InboundMessageContext::new(
                ack.payload,
                Some("conn-prover".to_string()),
            ))
            .await
            .unwrap();
        assert!(last.is_none());

        let verifier_record = verifier.get_by_id(verifier_record_id).await.unwrap();
        assert_eq!(verifier_record.state(), ProofState::Done);
        assert_eq!(verifier_record.is_verified(), Some(true))
    }
}
