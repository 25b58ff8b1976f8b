use rst_common::standard::async_trait::async_trait;

use crate::agent::context::InboundMessageContext;
use crate::agent::message::AgentMessage;

use super::options::{
    AcceptProofProposalOptions, NegotiateProofRequestOptions, PresentationOptions,
    ProposeProofOptions, RequestProofOptions,
};
use super::record::ProofExchangeRecord;
use super::types::{ProofError, ProofPreviews, ProofProtocolMsgReturn};

/// `ProofService` is the contract of a present-proof protocol version
#[async_trait]
pub trait ProofService: Send + Sync {
    type ProposeMessage: AgentMessage;
    type RequestMessage: AgentMessage;
    type PresentationMessage: AgentMessage;
    type AckMessage: AgentMessage;

    async fn create_proposal(
        &self,
        options: ProposeProofOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::ProposeMessage>, ProofError>;

    async fn process_proposal(
        &self,
        ctx: InboundMessageContext<Self::ProposeMessage>,
    ) -> Result<ProofExchangeRecord, ProofError>;

    async fn accept_proposal(
        &self,
        options: AcceptProofProposalOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::RequestMessage>, ProofError>;

    async fn create_request(
        &self,
        options: RequestProofOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::RequestMessage>, ProofError>;

    async fn process_request(
        &self,
        ctx: InboundMessageContext<Self::RequestMessage>,
    ) -> Result<ProofExchangeRecord, ProofError>;

    async fn negotiate_request(
        &self,
        options: NegotiateProofRequestOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::ProposeMessage>, ProofError>;

    async fn decline_request(
        &self,
        proof_record_id: String,
    ) -> Result<ProofExchangeRecord, ProofError>;

    async fn create_presentation(
        &self,
        record: ProofExchangeRecord,
        options: PresentationOptions,
    ) -> Result<ProofProtocolMsgReturn<Self::PresentationMessage>, ProofError>;

    /// `process_presentation` verifies the received presentation against the request
    /// this side sent and records the outcome on the record
    async fn process_presentation(
        &self,
        ctx: InboundMessageContext<Self::PresentationMessage>,
    ) -> Result<ProofExchangeRecord, ProofError>;

    async fn create_ack(
        &self,
        record: ProofExchangeRecord,
    ) -> Result<ProofProtocolMsgReturn<Self::AckMessage>, ProofError>;

    async fn process_ack(
        &self,
        ctx: InboundMessageContext<Self::AckMessage>,
    ) -> Result<ProofExchangeRecord, ProofError>;

    async fn find_previews(
        &self,
        record: &ProofExchangeRecord,
    ) -> Result<ProofPreviews, ProofError>;

    async fn get_by_id(&self, id: String) -> Result<ProofExchangeRecord, ProofError>;
}
