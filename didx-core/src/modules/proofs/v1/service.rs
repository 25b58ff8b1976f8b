use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::{info, warn};

use crate::agent::context::InboundMessageContext;
use crate::agent::message::{AgentMessage, MessageHeader};
use crate::modules::proofs::exchange::{ProofExchange, ProofStorage};
use crate::modules::proofs::options::{
    AcceptProofProposalOptions, NegotiateProofRequestOptions, PresentationOptions,
    ProposeProofOptions, RequestProofOptions,
};
use crate::modules::proofs::record::ProofExchangeRecord;
use crate::modules::proofs::service::ProofService;
use crate::modules::proofs::types::{
    ProofError, ProofPreviews, ProofProtocolMsgReturn, ProofRole, ProofState,
};
use crate::storage::didcomm::DidCommMessageRole;
use crate::storage::types::Record;
use crate::wallet::ProofWallet;

use super::messages::{
    V1PresentationAckMessage, V1PresentationMessage, V1ProposePresentationMessage,
    V1RequestPresentationMessage,
};

fn required(payload: Option<&Value>, what: &str) -> Result<Value, ProofError> {
    payload
        .cloned()
        .ok_or_else(|| ProofError::ValidationError(format!("message without {what}")))
}

/// `V1ProofService` implements present-proof 1.0 over Indy proof requests
#[derive(Clone)]
pub struct V1ProofService<TStorage: ProofStorage> {
    exchange: ProofExchange<TStorage>,
    wallet: Arc<dyn ProofWallet>,
}

impl<TStorage: ProofStorage> V1ProofService<TStorage> {
    pub fn new(storage: TStorage, wallet: Arc<dyn ProofWallet>) -> Self {
        Self {
            exchange: ProofExchange::new(storage),
            wallet,
        }
    }

    pub fn exchange(&self) -> &ProofExchange<TStorage> {
        &self.exchange
    }
}

#[async_trait]
impl<TStorage: ProofStorage> ProofService for V1ProofService<TStorage> {
    type ProposeMessage = V1ProposePresentationMessage;
    type RequestMessage = V1RequestPresentationMessage;
    type PresentationMessage = V1PresentationMessage;
    type AckMessage = V1PresentationAckMessage;

    async fn create_proposal(
        &self,
        options: ProposeProofOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::ProposeMessage>, ProofError> {
        let message = V1ProposePresentationMessage {
            header: MessageHeader::new(V1ProposePresentationMessage::MESSAGE_TYPE),
            comment: options.comment,
            presentation_proposal: options.presentation_proposal,
        };

        let record = ProofExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            ProofState::ProposalSent,
            ProofRole::Prover,
        )?
        .with_auto_accept(options.auto_accept_proof);

        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, true)
            .await?;

        info!("[proofs:v1] proposal created: {}", record.id());
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn process_proposal(
        &self,
        ctx: InboundMessageContext<Self::ProposeMessage>,
    ) -> Result<ProofExchangeRecord, ProofError> {
        let message = ctx.message;
        let thread_id = message.thread_id();
        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        let (record, is_new) = match existing {
            Some(mut record) => {
                record.assert_role(ProofRole::Verifier)?;
                record.assert_state(&[ProofState::RequestSent])?;
                record.transition(ProofState::ProposalReceived)?;
                (record, false)
            }
            None => {
                let record = ProofExchangeRecord::new(
                    ctx.connection_id,
                    thread_id,
                    ProofState::ProposalReceived,
                    ProofRole::Verifier,
                )?;
                (record, true)
            }
        };

        self.exchange
            .persist(&record, DidCommMessageRole::Receiver, &message, is_new)
            .await?;
        Ok(record)
    }

    async fn accept_proposal(
        &self,
        options: AcceptProofProposalOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::RequestMessage>, ProofError> {
        let mut record = self.exchange.get_by_id(options.proof_record_id).await?;
        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::ProposalReceived])?;

        let proposal = self
            .exchange
            .messages()
            .get_agent_message::<V1ProposePresentationMessage>(&record.id())
            .await?;

        let proof_request = proposal
            .presentation_proposal
            .to_proof_request(&options.name, &options.version);

        let message = V1RequestPresentationMessage::new(
            MessageHeader::new(V1RequestPresentationMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            options.comment,
            proof_request,
        );

        record.transition(ProofState::RequestSent)?;
        record.set_auto_accept(options.auto_accept_proof);

        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, false)
            .await?;
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn create_request(
        &self,
        options: RequestProofOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::RequestMessage>, ProofError> {
        let message = V1RequestPresentationMessage::new(
            MessageHeader::new(V1RequestPresentationMessage::MESSAGE_TYPE),
            options.comment,
            options.proof_request,
        );

        let record = ProofExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            ProofState::RequestSent,
            ProofRole::Verifier,
        )?
        .with_auto_accept(options.auto_accept_proof);

        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, true)
            .await?;

        info!("[proofs:v1] request created: {}", record.id());
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn process_request(
        &self,
        ctx: InboundMessageContext<Self::RequestMessage>,
    ) -> Result<ProofExchangeRecord, ProofError> {
        let message = ctx.message;
        required(message.proof_request(), "proof request")?;

        let thread_id = message.thread_id();
        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        let (record, is_new) = match existing {
            Some(mut record) => {
                record.assert_role(ProofRole::Prover)?;
                record.assert_state(&[ProofState::ProposalSent])?;
                record.transition(ProofState::RequestReceived)?;
                (record, false)
            }
            None => {
                let record = ProofExchangeRecord::new(
                    ctx.connection_id,
                    thread_id,
                    ProofState::RequestReceived,
                    ProofRole::Prover,
                )?;
                (record, true)
            }
        };

        self.exchange
            .persist(&record, DidCommMessageRole::Receiver, &message, is_new)
            .await?;
        Ok(record)
    }

    async fn negotiate_request(
        &self,
        options: NegotiateProofRequestOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::ProposeMessage>, ProofError> {
        let mut record = self.exchange.get_by_id(options.proof_record_id).await?;
        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::RequestReceived])?;

        let message = V1ProposePresentationMessage {
            header: MessageHeader::new(V1ProposePresentationMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            comment: options.comment,
            presentation_proposal: options.presentation_proposal,
        };

        record.transition(ProofState::ProposalSent)?;
        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, false)
            .await?;
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn decline_request(
        &self,
        proof_record_id: String,
    ) -> Result<ProofExchangeRecord, ProofError> {
        let mut record = self.exchange.get_by_id(proof_record_id).await?;
        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::RequestReceived])?;
        record.transition(ProofState::Declined)?;

        self.exchange.update_record(&record).await?;
        Ok(record)
    }

    async fn create_presentation(
        &self,
        record: ProofExchangeRecord,
        options: PresentationOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::PresentationMessage>, ProofError> {
        // guards run on the stored copy, the caller may hold a stale snapshot
        let mut record = self.exchange.get_by_id(record.id()).await?;
        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::RequestReceived])?;

        let request = self
            .exchange
            .messages()
            .get_agent_message::<V1RequestPresentationMessage>(&record.id())
            .await?;
        let proof_request = required(request.proof_request(), "proof request")?;
        let presentation = self.wallet.create_presentation(proof_request).await?;

        let message = V1PresentationMessage::new(
            MessageHeader::new(V1PresentationMessage::MESSAGE_TYPE).with_thread(record.thread_id()),
            options.comment,
            presentation,
        );

        record.transition(ProofState::PresentationSent)?;
        record.set_auto_accept(options.auto_accept_proof);

        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, false)
            .await?;
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn process_presentation(
        &self,
        ctx: InboundMessageContext<Self::PresentationMessage>,
    ) -> Result<ProofExchangeRecord, ProofError> {
        let message = ctx.message;
        let mut record = self
            .exchange
            .get_for_inbound(&message.thread_id(), ctx.connection_id.as_deref())
            .await?;

        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::RequestSent])?;

        let request = self
            .exchange
            .messages()
            .get_agent_message::<V1RequestPresentationMessage>(&record.id())
            .await?;
        let proof_request = required(request.proof_request(), "proof request")?;
        let presentation = required(message.presentation(), "presentation")?;

        let verified = self
            .wallet
            .verify_presentation(proof_request, presentation)
            .await?;
        if !verified {
            warn!("[proofs:v1] presentation not verified: {}", record.id());
        }

        record.set_verified(verified);
        record.transition(ProofState::PresentationReceived)?;

        self.exchange
            .persist(&record, DidCommMessageRole::Receiver, &message, false)
            .await?;
        Ok(record)
    }

    async fn create_ack(
        &self,
        record: ProofExchangeRecord,
    ) -> Result<ProofProtocolMsgReturn<Self::AckMessage>, ProofError> {
        // guards run on the stored copy, the caller may hold a stale snapshot
        let mut record = self.exchange.get_by_id(record.id()).await?;
        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::PresentationReceived])?;

        let message = V1PresentationAckMessage {
            header: MessageHeader::new(V1PresentationAckMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            status: "OK".to_string(),
        };

        record.transition(ProofState::Done)?;
        self.exchange
            .persist(&record, DidCommMessageRole::Sender, &message, false)
            .await?;
        Ok(ProofProtocolMsgReturn::new(record, message))
    }

    async fn process_ack(
        &self,
        ctx: InboundMessageContext<Self::AckMessage>,
    ) -> Result<ProofExchangeRecord, ProofError> {
        let message = ctx.message;
        let mut record = self
            .exchange
            .get_for_inbound(&message.thread_id(), ctx.connection_id.as_deref())
            .await?;

        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::PresentationSent])?;
        record.transition(ProofState::Done)?;

        self.exchange
            .persist(&record, DidCommMessageRole::Receiver, &message, false)
            .await?;
        Ok(record)
    }

    async fn find_previews(
        &self,
        record: &ProofExchangeRecord,
    ) -> Result<ProofPreviews, ProofError> {
        let messages = self.exchange.messages();

        let proposal = messages
            .find_agent_message::<V1ProposePresentationMessage>(&record.id())
            .await?
            .map(|proposal| proposal.presentation_proposal);

        let request = messages
            .find_agent_message::<V1RequestPresentationMessage>(&record.id())
            .await?
            .and_then(|request| request.proof_request().cloned());

        Ok(ProofPreviews { proposal, request })
    }

    async fn get_by_id(&self, id: String) -> Result<ProofExchangeRecord, ProofError> {
        self.exchange.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use crate::modules::proofs::types::{PresentationPreview, PresentationPreviewAttribute};
    use crate::storage::memory::InMemoryStorage;
    use crate::wallet::fake::FakeWallet;

    fn generate_service(verified: bool) -> V1ProofService<InMemoryStorage> {
        V1ProofService::new(InMemoryStorage::new(), Arc::new(FakeWallet::new(verified)))
    }

    fn deliver<TMessage: AgentMessage>(
        message: &TMessage,
        connection_id: &str,
    ) -> InboundMessageContext<TMessage> {
        let value = message.to_value().unwrap();
        InboundMessageContext::new(value, Some(connection_id.to_string()))
            .into_typed::<TMessage>()
            .unwrap()
    }

    fn preview() -> PresentationPreview {
        PresentationPreview::new(
            vec![PresentationPreviewAttribute::new("name", Some("cred-def-1"))],
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_exchange_from_proposal() {
        let prover = generate_service(true);
        let verifier = generate_service(true);

        let proposal = prover
            .create_proposal(ProposeProofOptions::new("conn-prover", preview()))
            .await
            .unwrap();
        assert_eq!(proposal.record.state(), ProofState::ProposalSent);

        let verifier_record = verifier
            .process_proposal(deliver(&proposal.message, "conn-verifier"))
            .await
            .unwrap();
        assert_eq!(verifier_record.thread_id(), proposal.record.thread_id());

        let request = verifier
            .accept_proposal(AcceptProofProposalOptions::new(&verifier_record.id()))
            .await
            .unwrap();
        assert_eq!(
            request.message.proof_request().unwrap()["requested_attributes"]["attr_0"]["name"],
            json!("name")
        );

        let prover_record = prover
            .process_request(deliver(&request.message, "conn-prover"))
            .await
            .unwrap();
        assert_eq!(prover_record.id(), proposal.record.id());

        let presentation = prover
            .create_presentation(prover_record, PresentationOptions::default())
            .await
            .unwrap();

        let verifier_record = verifier
            .process_presentation(deliver(&presentation.message, "conn-verifier"))
            .await
            .unwrap();
        assert_eq!(verifier_record.is_verified(), Some(true));

        let ack = verifier.create_ack(verifier_record).await.unwrap();
        let prover_record = prover
            .process_ack(deliver(&ack.message, "conn-prover"))
            .await
            .unwrap();
        assert_eq!(prover_record.state(), ProofState::Done);

        let replay = prover.process_ack(deliver(&ack.message, "conn-prover")).await;
        assert!(matches!(
            replay.unwrap_err(),
            ProofError::ThreadClosed { .. }
        ))
    }

    #[tokio::test]
    async fn test_failed_verification_is_recorded() {
        let prover = generate_service(true);
        let verifier = generate_service(false);

        let request = verifier
            .create_request(RequestProofOptions::new(
                "conn-verifier",
                preview().to_proof_request("proof-request", "1.0"),
            ))
            .await
            .unwrap();

        let prover_record = prover
            .process_request(deliver(&request.message, "conn-prover"))
            .await
            .unwrap();
        assert_eq!(prover_record.role(), ProofRole::Prover);

        let presentation = prover
            .create_presentation(prover_record, PresentationOptions::default())
            .await
            .unwrap();

        let verifier_record = verifier
            .process_presentation(deliver(&presentation.message, "conn-verifier"))
            .await
            .unwrap();
        assert_eq!(verifier_record.is_verified(), Some(false));
        assert_eq!(verifier_record.state(), ProofState::PresentationReceived)
    }

    #[tokio::test]
    async fn test_counter_proposal_and_decline() {
        let prover = generate_service(true);
        let verifier = generate_service(true);

        let request = verifier
            .create_request(RequestProofOptions::new(
                "conn-verifier",
                preview().to_proof_request("proof-request", "1.0"),
            ))
            .await
            .unwrap();
        let prover_record = prover
            .process_request(deliver(&request.message, "conn-prover"))
            .await
            .unwrap();

        let counter = prover
            .negotiate_request(NegotiateProofRequestOptions {
                proof_record_id: prover_record.id(),
                presentation_proposal: preview(),
                comment: None,
            })
            .await
            .unwrap();
        assert_eq!(counter.record.state(), ProofState::ProposalSent);

        let verifier_record = verifier
            .process_proposal(deliver(&counter.message, "conn-verifier"))
            .await
            .unwrap();
        assert_eq!(verifier_record.state(), ProofState::ProposalReceived);
        assert_eq!(verifier_record.id(), request.record.id());

        let second = verifier
            .accept_proposal(AcceptProofProposalOptions::new(&verifier_record.id()))
            .await
            .unwrap();
        let prover_record = prover
            .process_request(deliver(&second.message, "conn-prover"))
            .await
            .unwrap();

        let declined = prover.decline_request(prover_record.id()).await.unwrap();
        assert_eq!(declined.state(), ProofState::Declined);

        let stale = prover
            .create_presentation(prover_record.clone(), PresentationOptions::default())
            .await;
        assert!(matches!(stale.unwrap_err(), ProofError::InvalidState { .. }));
        assert_eq!(
            prover.get_by_id(prover_record.id()).await.unwrap().state(),
            ProofState::Declined
        );

        let stored = prover
            .exchange()
            .messages()
            .find_by_associated_record_id(&declined.id())
            .await
            .unwrap();
        assert_eq!(stored.len(), 2)
    }

    #[tokio::test]
    async fn test_presentation_before_request() {
        let prover = generate_service(true);
        let proposal = prover
            .create_proposal(ProposeProofOptions::new("conn-prover", preview()))
            .await
            .unwrap();

        let result = prover
            .create_presentation(proposal.record, PresentationOptions::default())
            .await;
        assert!(matches!(
            result.unwrap_err(),
            ProofError::InvalidState { .. }
        ))
    }
}
