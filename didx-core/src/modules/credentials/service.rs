use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;

use crate::agent::context::InboundMessageContext;
use crate::agent::message::AgentMessage;

use super::formats::CredentialFormatService;
use super::options::{
    AcceptProposalOptions, AcceptRequestOptions, NegotiateOfferOptions, OfferCredentialOptions,
    ProposeCredentialOptions, RequestCredentialOptions,
};
use super::record::CredentialExchangeRecord;
use super::types::{
    CredentialError, CredentialFormatType, CredentialPreviews, CredentialProtocolMsgReturn,
    CredentialProtocolVersion,
};

/// `CredentialService` is the contract every issue-credential protocol version
/// implements
///
/// The associated message types bind each step to the wire messages of the version, the
/// record state guards and the transition table are the same for all of them
#[async_trait]
pub trait CredentialService: Send + Sync {
    type ProposeMessage: AgentMessage;
    type OfferMessage: AgentMessage;
    type RequestMessage: AgentMessage;
    type IssueMessage: AgentMessage;
    type AckMessage: AgentMessage;

    fn version(&self) -> CredentialProtocolVersion;

    fn get_format_service(
        &self,
        format_type: CredentialFormatType,
    ) -> Result<Arc<dyn CredentialFormatService>, CredentialError> {
        Err(CredentialError::NotImplemented(format!(
            "format service {} for protocol {}",
            format_type,
            self.version()
        )))
    }

    async fn create_proposal(
        &self,
        options: ProposeCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::ProposeMessage>, CredentialError>;

    async fn process_proposal(
        &self,
        ctx: InboundMessageContext<Self::ProposeMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    async fn accept_proposal(
        &self,
        options: AcceptProposalOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::OfferMessage>, CredentialError>;

    async fn create_offer(
        &self,
        options: OfferCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::OfferMessage>, CredentialError>;

    async fn process_offer(
        &self,
        ctx: InboundMessageContext<Self::OfferMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    async fn negotiate_offer(
        &self,
        options: NegotiateOfferOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::ProposeMessage>, CredentialError>;

    async fn decline_offer(
        &self,
        credential_record_id: String,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    async fn create_request(
        &self,
        record: CredentialExchangeRecord,
        options: RequestCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::RequestMessage>, CredentialError>;

    async fn process_request(
        &self,
        ctx: InboundMessageContext<Self::RequestMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    async fn accept_request(
        &self,
        options: AcceptRequestOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::IssueMessage>, CredentialError>;

    async fn process_credential(
        &self,
        ctx: InboundMessageContext<Self::IssueMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    async fn create_ack(
        &self,
        record: CredentialExchangeRecord,
    ) -> Result<CredentialProtocolMsgReturn<Self::AckMessage>, CredentialError>;

    async fn process_ack(
        &self,
        ctx: InboundMessageContext<Self::AckMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError>;

    /// `find_previews` reads back the last proposal and offer stored for the record
    async fn find_previews(
        &self,
        record: &CredentialExchangeRecord,
    ) -> Result<CredentialPreviews, CredentialError>;

    async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, CredentialError>;
}
