use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::info;

use crate::agent::context::InboundMessageContext;
use crate::agent::message::{AgentMessage, Attachment, MessageHeader};
use crate::modules::credentials::exchange::{CredentialExchange, CredentialStorage};
use crate::modules::credentials::formats::{CredentialFormatService, IndyCredentialFormatService};
use crate::modules::credentials::options::{
    AcceptProposalOptions, AcceptRequestOptions, NegotiateOfferOptions, OfferCredentialOptions,
    ProposeCredentialOptions, RequestCredentialOptions,
};
use crate::modules::credentials::record::CredentialExchangeRecord;
use crate::modules::credentials::service::CredentialService;
use crate::modules::credentials::types::{
    CredentialError, CredentialFormat, CredentialFormatType, CredentialPreviews,
    CredentialProtocolMsgReturn, CredentialProtocolVersion, CredentialRole, CredentialState,
    IndyCredentialFormat,
};
use crate::storage::didcomm::DidCommMessageRole;
use crate::storage::types::Record;
use crate::wallet::CredentialWallet;

use super::messages::{
    v1_preview, V1CredentialAckMessage, V1IssueCredentialMessage, V1OfferCredentialMessage,
    V1ProposeCredentialMessage, V1RequestCredentialMessage,
};

fn first_payload(attachments: &[Attachment], kind: &str) -> Result<Value, CredentialError> {
    attachments
        .first()
        .map(|attachment| attachment.data.json.clone())
        .ok_or_else(|| CredentialError::ValidationError(format!("{kind} without attachment")))
}

fn require_indy(format: &CredentialFormat) -> Result<IndyCredentialFormat, CredentialError> {
    match format {
        CredentialFormat::Indy(indy) => Ok(indy.clone()),
        other => Err(CredentialError::UnsupportedFormat(format!(
            "{} is not available on issue-credential v1",
            other.format_type()
        ))),
    }
}

/// `V1CredentialService` implements issue-credential 1.0, which only knows the Indy
/// credential format
#[derive(Clone)]
pub struct V1CredentialService<TStorage: CredentialStorage> {
    exchange: CredentialExchange<TStorage>,
    indy: Arc<dyn CredentialFormatService>,
}

impl<TStorage: CredentialStorage> V1CredentialService<TStorage> {
    pub fn new(storage: TStorage, wallet: Arc<dyn CredentialWallet>) -> Self {
        Self {
            exchange: CredentialExchange::new(storage),
            indy: Arc::new(IndyCredentialFormatService::new(wallet)),
        }
    }

    pub fn exchange(&self) -> &CredentialExchange<TStorage> {
        &self.exchange
    }

    async fn build_offer(
        &self,
        header: MessageHeader,
        indy: IndyCredentialFormat,
        comment: Option<String>,
    ) -> Result<V1OfferCredentialMessage, CredentialError> {
        let attachment = self
            .indy
            .create_offer(&CredentialFormat::Indy(indy.clone()))
            .await?;

        Ok(V1OfferCredentialMessage {
            header,
            comment,
            credential_preview: v1_preview(indy.attributes),
            offers_attach: vec![attachment.attachment],
        })
    }
}

#[async_trait]
impl<TStorage: CredentialStorage> CredentialService for V1CredentialService<TStorage> {
    type ProposeMessage = V1ProposeCredentialMessage;
    type OfferMessage = V1OfferCredentialMessage;
    type RequestMessage = V1RequestCredentialMessage;
    type IssueMessage = V1IssueCredentialMessage;
    type AckMessage = V1CredentialAckMessage;

    fn version(&self) -> CredentialProtocolVersion {
        CredentialProtocolVersion::V1
    }

    fn get_format_service(
        &self,
        format_type: CredentialFormatType,
    ) -> Result<Arc<dyn CredentialFormatService>, CredentialError> {
        match format_type {
            CredentialFormatType::Indy => Ok(self.indy.clone()),
            other => Err(CredentialError::UnsupportedFormat(format!(
                "{other} is not available on issue-credential v1"
            ))),
        }
    }

    async fn create_proposal(
        &self,
        options: ProposeCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::ProposeMessage>, CredentialError> {
        let indy = require_indy(&options.credential_format)?;

        let message = V1ProposeCredentialMessage {
            header: MessageHeader::new(V1ProposeCredentialMessage::MESSAGE_TYPE),
            comment: options.comment,
            credential_proposal: Some(v1_preview(indy.attributes.clone())),
            schema_id: indy.schema_id,
            cred_def_id: indy.credential_definition_id,
        };

        let record = CredentialExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            CredentialState::ProposalSent,
            CredentialRole::Holder,
            CredentialProtocolVersion::V1,
            CredentialFormatType::Indy,
        )?
        .with_auto_accept(options.auto_accept_credential)
        .with_attributes(indy.attributes);

        self.exchange
            .persist_new(&record, DidCommMessageRole::Sender, &message)
            .await?;

        info!("[credentials:v1] proposal created: {}", record.id());
        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_proposal(
        &self,
        ctx: InboundMessageContext<Self::ProposeMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let thread_id = message.thread_id();
        let attributes = message
            .credential_proposal
            .as_ref()
            .map(|preview| preview.attributes.clone())
            .unwrap_or_default();

        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        match existing {
            Some(mut record) => {
                record.assert_role(CredentialRole::Issuer)?;
                record.assert_state(&[CredentialState::OfferSent])?;
                record.transition(CredentialState::ProposalReceived)?;
                record.set_attributes(attributes);

                self.exchange
                    .persist_update(&record, DidCommMessageRole::Receiver, &message)
                    .await?;
                Ok(record)
            }
            None => {
                let record = CredentialExchangeRecord::new(
                    ctx.connection_id,
                    thread_id,
                    CredentialState::ProposalReceived,
                    CredentialRole::Issuer,
                    CredentialProtocolVersion::V1,
                    CredentialFormatType::Indy,
                )?
                .with_attributes(attributes);

                self.exchange
                    .persist_new(&record, DidCommMessageRole::Receiver, &message)
                    .await?;
                Ok(record)
            }
        }
    }

    async fn accept_proposal(
        &self,
        options: AcceptProposalOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::OfferMessage>, CredentialError> {
        let mut record = self.exchange.get_by_id(options.credential_record_id).await?;
        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::ProposalReceived])?;

        let indy = match options.credential_format {
            Some(format) => require_indy(&format)?,
            None => {
                let proposal = self
                    .exchange
                    .messages()
                    .get_agent_message::<V1ProposeCredentialMessage>(&record.id())
                    .await?;

                IndyCredentialFormat {
                    credential_definition_id: proposal.cred_def_id,
                    schema_id: proposal.schema_id,
                    attributes: record.credential_attributes().to_vec(),
                }
            }
        };

        let header = MessageHeader::new(V1OfferCredentialMessage::MESSAGE_TYPE)
            .with_thread(record.thread_id());
        let attributes = indy.attributes.clone();
        let message = self.build_offer(header, indy, options.comment).await?;

        record.transition(CredentialState::OfferSent)?;
        record.set_attributes(attributes);
        record.set_auto_accept(options.auto_accept_credential);

        self.exchange
            .persist_update(&record, DidCommMessageRole::Sender, &message)
            .await?;

        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn create_offer(
        &self,
        options: OfferCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::OfferMessage>, CredentialError> {
        let indy = require_indy(&options.credential_format)?;
        let attributes = indy.attributes.clone();

        let header = MessageHeader::new(V1OfferCredentialMessage::MESSAGE_TYPE);
        let message = self.build_offer(header, indy, options.comment).await?;

        let record = CredentialExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            CredentialState::OfferSent,
            CredentialRole::Issuer,
            CredentialProtocolVersion::V1,
            CredentialFormatType::Indy,
        )?
        .with_auto_accept(options.auto_accept_credential)
        .with_attributes(attributes);

        self.exchange
            .persist_new(&record, DidCommMessageRole::Sender, &message)
            .await?;

        info!("[credentials:v1] offer created: {}", record.id());
        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_offer(
        &self,
        ctx: InboundMessageContext<Self::OfferMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let thread_id = message.thread_id();
        let attributes = message.credential_preview.attributes.clone();

        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        match existing {
            Some(mut record) => {
                record.assert_role(CredentialRole::Holder)?;
                record.assert_state(&[CredentialState::ProposalSent])?;
                record.transition(CredentialState::OfferReceived)?;
                record.set_attributes(attributes);

                self.exchange
                    .persist_update(&record, DidCommMessageRole::Receiver, &message)
                    .await?;
                Ok(record)
            }
            None => {
                let record = CredentialExchangeRecord::new(
                    ctx.connection_id,
                    thread_id,
                    CredentialState::OfferReceived,
                    CredentialRole::Holder,
                    CredentialProtocolVersion::V1,
                    CredentialFormatType::Indy,
                )?
                .with_attributes(attributes);

                self.exchange
                    .persist_new(&record, DidCommMessageRole::Receiver, &message)
                    .await?;
                Ok(record)
            }
        }
    }

    async fn negotiate_offer(
        &self,
        options: NegotiateOfferOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::ProposeMessage>, CredentialError> {
        let mut record = self.exchange.get_by_id(options.credential_record_id).await?;
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::OfferReceived])?;

        let indy = require_indy(&options.credential_format)?;
        let message = V1ProposeCredentialMessage {
            header: MessageHeader::new(V1ProposeCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            comment: options.comment,
            credential_proposal: Some(v1_preview(indy.attributes.clone())),
            schema_id: indy.schema_id,
            cred_def_id: indy.credential_definition_id,
        };

        record.transition(CredentialState::ProposalSent)?;
        record.set_attributes(indy.attributes);
        record.set_auto_accept(options.auto_accept_credential);

        self.exchange
            .persist_update(&record, DidCommMessageRole::Sender, &message)
            .await?;

        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn decline_offer(
        &self,
        credential_record_id: String,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let mut record = self.exchange.get_by_id(credential_record_id).await?;
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::OfferReceived])?;
        record.transition(CredentialState::Declined)?;

        self.exchange.update_record(&record).await?;
        Ok(record)
    }

    async fn create_request(
        &self,
        record: CredentialExchangeRecord,
        options: RequestCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::RequestMessage>, CredentialError> {
        // guards run on the stored copy, the caller may hold a stale snapshot
        let mut record = self.exchange.get_by_id(record.id()).await?;
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::OfferReceived])?;

        let offer = self
            .exchange
            .messages()
            .get_agent_message::<V1OfferCredentialMessage>(&record.id())
            .await?;
        let offer_payload = first_payload(&offer.offers_attach, "offer")?;

        let attachment = self
            .indy
            .create_request(&offer_payload, options.holder_did)
            .await?;

        let message = V1RequestCredentialMessage {
            header: MessageHeader::new(V1RequestCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            comment: options.comment,
            requests_attach: vec![attachment.attachment],
        };

        record.transition(CredentialState::RequestSent)?;
        record.set_auto_accept(options.auto_accept_credential);

        self.exchange
            .persist_update(&record, DidCommMessageRole::Sender, &message)
            .await?;

        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_request(
        &self,
        ctx: InboundMessageContext<Self::RequestMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let mut record = self
            .exchange
            .get_for_inbound(&message.thread_id(), ctx.connection_id.as_deref())
            .await?;

        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::OfferSent])?;
        record.transition(CredentialState::RequestReceived)?;

        self.exchange
            .persist_update(&record, DidCommMessageRole::Receiver, &message)
            .await?;
        Ok(record)
    }

    async fn accept_request(
        &self,
        options: AcceptRequestOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::IssueMessage>, CredentialError> {
        let mut record = self.exchange.get_by_id(options.credential_record_id).await?;
        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::RequestReceived])?;

        let offer = self
            .exchange
            .messages()
            .get_agent_message::<V1OfferCredentialMessage>(&record.id())
            .await?;
        let request = self
            .exchange
            .messages()
            .get_agent_message::<V1RequestCredentialMessage>(&record.id())
            .await?;

        let attachment = self
            .indy
            .create_credential(
                &first_payload(&offer.offers_attach, "offer")?,
                &first_payload(&request.requests_attach, "request")?,
                record.credential_attributes().to_vec(),
            )
            .await?;

        let message = V1IssueCredentialMessage {
            header: MessageHeader::new(V1IssueCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            comment: options.comment,
            credentials_attach: vec![attachment.attachment],
        };

        record.transition(CredentialState::CredentialIssued)?;
        record.set_auto_accept(options.auto_accept_credential);

        self.exchange
            .persist_update(&record, DidCommMessageRole::Sender, &message)
            .await?;

        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_credential(
        &self,
        ctx: InboundMessageContext<Self::IssueMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let mut record = self
            .exchange
            .get_for_inbound(&message.thread_id(), ctx.connection_id.as_deref())
            .await?;

        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::RequestSent])?;

        let credential = first_payload(&message.credentials_attach, "credential")?;
        let credential_id = self.indy.process_credential(&credential).await?;

        record.set_credential_id(credential_id);
        record.transition(CredentialState::CredentialReceived)?;

        self.exchange
            .persist_update(&record, DidCommMessageRole::Receiver, &message)
            .await?;
        Ok(record)
    }

    async fn create_ack(
        &self,
        record: CredentialExchangeRecord,
    ) -> Result<CredentialProtocolMsgReturn<Self::AckMessage>, CredentialError> {
        // guards run on the stored copy, the caller may hold a stale snapshot
        let mut record = self.exchange.get_by_id(record.id()).await?;
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::CredentialReceived])?;

        let message = V1CredentialAckMessage {
            header: MessageHeader::new(V1CredentialAckMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            status: "OK".to_string(),
        };

        record.transition(CredentialState::Done)?;
        self.exchange
            .persist_update(&record, DidCommMessageRole::Sender, &message)
            .await?;

        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_ack(
        &self,
        ctx: InboundMessageContext<Self::AckMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let mut record = self
            .exchange
            .get_for_inbound(&message.thread_id(), ctx.connection_id.as_deref())
            .await?;

        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::CredentialIssued])?;
        record.transition(CredentialState::Done)?;

        self.exchange
            .persist_update(&record, DidCommMessageRole::Receiver, &message)
            .await?;
        Ok(record)
    }

    async fn find_previews(
        &self,
        record: &CredentialExchangeRecord,
    ) -> Result<CredentialPreviews, CredentialError> {
        let messages = self.exchange.messages();

        let proposal = messages
            .find_agent_message::<V1ProposeCredentialMessage>(&record.id())
            .await?
            .map(|proposal| {
                proposal
                    .credential_proposal
                    .map(|preview| preview.attributes)
                    .unwrap_or_default()
            });

        let offer = messages
            .find_agent_message::<V1OfferCredentialMessage>(&record.id())
            .await?
            .map(|offer| offer.credential_preview.attributes);

        Ok(CredentialPreviews { proposal, offer })
    }

    async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, CredentialError> {
        self.exchange.get_by_id(id).await
    }
}
