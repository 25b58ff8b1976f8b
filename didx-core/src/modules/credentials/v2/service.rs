use std::collections::HashMap;
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::info;

use crate::agent::context::InboundMessageContext;
use crate::agent::message::{AgentMessage, MessageHeader};
use crate::modules::credentials::exchange::{CredentialExchange, CredentialStorage};
use crate::modules::credentials::formats::{
    CredentialFormatService, IndyCredentialFormatService, W3cCredentialFormatService,
};
use crate::modules::credentials::options::{
    AcceptProposalOptions, AcceptRequestOptions, NegotiateOfferOptions, OfferCredentialOptions,
    ProposeCredentialOptions, RequestCredentialOptions,
};
use crate::modules::credentials::record::CredentialExchangeRecord;
use crate::modules::credentials::service::CredentialService;
use crate::modules::credentials::types::{
    CredentialError, CredentialFormat, CredentialFormatType, CredentialPreview,
    CredentialPreviewAttribute, CredentialPreviews, CredentialProtocolMsgReturn,
    CredentialProtocolVersion, CredentialRole, CredentialState,
};
use crate::storage::didcomm::DidCommMessageRole;
use crate::storage::types::Record;
use crate::wallet::CredentialWallet;

use super::messages::{
    v2_preview, FormattedAttachments, V2CredentialAckMessage, V2IssueCredentialMessage,
    V2OfferCredentialMessage, V2ProposeCredentialMessage, V2RequestCredentialMessage,
};

fn build_preview(attributes: &[CredentialPreviewAttribute]) -> Option<CredentialPreview> {
    if attributes.is_empty() {
        return None;
    }

    Some(v2_preview(attributes.to_vec()))
}

fn preview_attributes(preview: &Option<CredentialPreview>) -> Vec<CredentialPreviewAttribute> {
    preview
        .as_ref()
        .map(|preview| preview.attributes.clone())
        .unwrap_or_default()
}

fn ensure_format(
    record: &CredentialExchangeRecord,
    format_type: CredentialFormatType,
) -> Result<(), CredentialError> {
    if record.format_type() == format_type {
        return Ok(());
    }

    Err(CredentialError::FormatMismatch {
        expected: record.format_type().to_string(),
        actual: format_type.to_string(),
    })
}

/// `V2CredentialService` implements issue-credential 2.0, the payload of every step is
/// shaped by the format service registered for the record's format
#[derive(Clone)]
pub struct V2CredentialService<TStorage: CredentialStorage> {
    exchange: CredentialExchange<TStorage>,
    formats: HashMap<CredentialFormatType, Arc<dyn CredentialFormatService>>,
}

impl<TStorage: CredentialStorage> V2CredentialService<TStorage> {
    pub fn new(storage: TStorage, wallet: Arc<dyn CredentialWallet>) -> Self {
        let mut formats: HashMap<CredentialFormatType, Arc<dyn CredentialFormatService>> =
            HashMap::new();
        formats.insert(
            CredentialFormatType::Indy,
            Arc::new(IndyCredentialFormatService::new(wallet.clone())),
        );
        formats.insert(
            CredentialFormatType::W3c,
            Arc::new(W3cCredentialFormatService::new(wallet)),
        );

        Self {
            exchange: CredentialExchange::new(storage),
            formats,
        }
    }

    pub fn exchange(&self) -> &CredentialExchange<TStorage> {
        &self.exchange
    }
}

#[async_trait]
impl<TStorage: CredentialStorage> CredentialService for V2CredentialService<TStorage> {
    type ProposeMessage = V2ProposeCredentialMessage;
    type OfferMessage = V2OfferCredentialMessage;
    type RequestMessage = V2RequestCredentialMessage;
    type IssueMessage = V2IssueCredentialMessage;
    type AckMessage = V2CredentialAckMessage;

    fn version(&self) -> CredentialProtocolVersion {
        CredentialProtocolVersion::V2
    }

    fn get_format_service(
        &self,
        format_type: CredentialFormatType,
    ) -> Result<Arc<dyn CredentialFormatService>, CredentialError> {
        self.formats
            .get(&format_type)
            .cloned()
            .ok_or_else(|| CredentialError::UnsupportedFormat(format_type.to_string()))
    }

    async fn create_proposal(
        &self,
        options: ProposeCredentialOptions,
    ) -> Result<CredentialProtocolMsgReturn<Self::ProposeMessage>, CredentialError> {
        let format_type = options.credential_format.format_type();
        let attributes = options.credential_format.attributes();

        let attachment = self
            .get_format_service(format_type)?
            .create_proposal(&options.credential_format)
            .await?;

        let message = V2ProposeCredentialMessage::new(
            MessageHeader::new(V2ProposeCredentialMessage::MESSAGE_TYPE),
            options.comment,
            build_preview(&attributes),
            attachment,
        );

        let record = CredentialExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            CredentialState::ProposalSent,
            CredentialRole::Holder,
            CredentialProtocolVersion::V2,
            format_type,
        )?
        .with_auto_accept(options.auto_accept_credential)
        .with_attributes(attributes);

        self.exchange
            .persist_new(&record, DidCommMessageRole::Sender, &message)
            .await?;

        info!(
            "[credentials:v2] proposal created: {} | format: {}",
            record.id(),
            format_type
        );
        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_proposal(
        &self,
        ctx: InboundMessageContext<Self::ProposeMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let thread_id = message.thread_id();
        let format_type = message.format_type()?;
        self.get_format_service(format_type)?;

        let attributes = preview_attributes(&message.credential_preview);
        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        match existing {
            Some(mut record) => {
                record.assert_role(CredentialRole::Issuer)?;
                record.assert_state(&[CredentialState::OfferSent])?;
                ensure_format(&record, format_type)?;
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
                    CredentialProtocolVersion::V2,
                    format_type,
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

        let format_service = self.get_format_service(record.format_type())?;
        let format = match options.credential_format {
            Some(format) => format,
            None => {
                let proposal = self
                    .exchange
                    .messages()
                    .get_agent_message::<V2ProposeCredentialMessage>(&record.id())
                    .await?;
                let filter = proposal.attachment_for(record.format_type())?;

                format_service.format_from_proposal(
                    &filter.data.json,
                    record.credential_attributes().to_vec(),
                )?
            }
        };
        ensure_format(&record, format.format_type())?;

        let attachment = format_service.create_offer(&format).await?;
        let attributes = format.attributes();
        let message = V2OfferCredentialMessage::new(
            MessageHeader::new(V2OfferCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            options.comment,
            build_preview(&attributes),
            attachment,
        );

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
        let format_type = options.credential_format.format_type();
        let attributes = options.credential_format.attributes();

        let attachment = self
            .get_format_service(format_type)?
            .create_offer(&options.credential_format)
            .await?;

        let message = V2OfferCredentialMessage::new(
            MessageHeader::new(V2OfferCredentialMessage::MESSAGE_TYPE),
            options.comment,
            build_preview(&attributes),
            attachment,
        );

        let record = CredentialExchangeRecord::new(
            Some(options.connection_id),
            message.thread_id(),
            CredentialState::OfferSent,
            CredentialRole::Issuer,
            CredentialProtocolVersion::V2,
            format_type,
        )?
        .with_auto_accept(options.auto_accept_credential)
        .with_attributes(attributes);

        self.exchange
            .persist_new(&record, DidCommMessageRole::Sender, &message)
            .await?;

        info!(
            "[credentials:v2] offer created: {} | format: {}",
            record.id(),
            format_type
        );
        Ok(CredentialProtocolMsgReturn::new(record, message))
    }

    async fn process_offer(
        &self,
        ctx: InboundMessageContext<Self::OfferMessage>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let message = ctx.message;
        let thread_id = message.thread_id();
        let format_type = message.format_type()?;
        self.get_format_service(format_type)?;

        let attributes = preview_attributes(&message.credential_preview);
        let existing = self
            .exchange
            .find_for_inbound(&thread_id, ctx.connection_id.as_deref())
            .await?;

        match existing {
            Some(mut record) => {
                record.assert_role(CredentialRole::Holder)?;
                record.assert_state(&[CredentialState::ProposalSent])?;
                ensure_format(&record, format_type)?;
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
                    CredentialProtocolVersion::V2,
                    format_type,
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
        ensure_format(&record, options.credential_format.format_type())?;

        let attributes = options.credential_format.attributes();
        let attachment = self
            .get_format_service(record.format_type())?
            .create_proposal(&options.credential_format)
            .await?;

        let message = V2ProposeCredentialMessage::new(
            MessageHeader::new(V2ProposeCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            options.comment,
            build_preview(&attributes),
            attachment,
        );

        record.transition(CredentialState::ProposalSent)?;
        record.set_attributes(attributes);
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
            .get_agent_message::<V2OfferCredentialMessage>(&record.id())
            .await?;
        let offer_attachment = offer.attachment_for(record.format_type())?;

        let attachment = self
            .get_format_service(record.format_type())?
            .create_request(&offer_attachment.data.json, options.holder_did)
            .await?;

        let message = V2RequestCredentialMessage::new(
            MessageHeader::new(V2RequestCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            options.comment,
            attachment,
        );

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
        ensure_format(&record, message.format_type()?)?;
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

        let messages = self.exchange.messages();
        let offer = messages
            .get_agent_message::<V2OfferCredentialMessage>(&record.id())
            .await?;
        let request = messages
            .get_agent_message::<V2RequestCredentialMessage>(&record.id())
            .await?;

        let attachment = self
            .get_format_service(record.format_type())?
            .create_credential(
                &offer.attachment_for(record.format_type())?.data.json,
                &request.attachment_for(record.format_type())?.data.json,
                record.credential_attributes().to_vec(),
            )
            .await?;

        let message = V2IssueCredentialMessage::new(
            MessageHeader::new(V2IssueCredentialMessage::MESSAGE_TYPE)
                .with_thread(record.thread_id()),
            options.comment,
            attachment,
        );

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

        let credential = message.attachment_for(record.format_type())?;
        let credential_id = self
            .get_format_service(record.format_type())?
            .process_credential(&credential.data.json)
            .await?;

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

        let message = V2CredentialAckMessage {
            header: MessageHeader::new(V2CredentialAckMessage::MESSAGE_TYPE)
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
            .find_agent_message::<V2ProposeCredentialMessage>(&record.id())
            .await?
            .map(|proposal| preview_attributes(&proposal.credential_preview));

        let offer = messages
            .find_agent_message::<V2OfferCredentialMessage>(&record.id())
            .await?
            .map(|offer| preview_attributes(&offer.credential_preview));

        Ok(CredentialPreviews { proposal, offer })
    }

    async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, CredentialError> {
        self.exchange.get_by_id(id).await
    }
}
