use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::info;

use crate::agent::context::{InboundMessageContext, OutboundMessage};
use crate::agent::handler::Handler;
use crate::agent::message::AgentMessage;
use crate::agent::types::AgentError;
use crate::storage::types::Record;

use super::coordinator::CredentialResponseCoordinator;
use super::options::{AcceptProposalOptions, AcceptRequestOptions, RequestCredentialOptions};
use super::record::CredentialExchangeRecord;
use super::service::CredentialService;
use super::types::CredentialProtocolMsgReturn;

fn reply<TMessage: AgentMessage>(
    result: CredentialProtocolMsgReturn<TMessage>,
) -> Result<Option<OutboundMessage>, AgentError> {
    let outbound = result.into_outbound()?;
    info!(
        "[credentials:handler] auto reply: {} | record: {}",
        outbound.message.message_type,
        outbound.record.id()
    );

    Ok(Some(outbound.message))
}

fn processed(step: &str, record: &CredentialExchangeRecord) {
    info!(
        "[credentials:handler] {} processed | record: {} | state: {}",
        step,
        record.id(),
        record.state()
    );
}

pub struct ProposeCredentialHandler<TService: CredentialService> {
    service: Arc<TService>,
    coordinator: CredentialResponseCoordinator,
}

impl<TService: CredentialService> ProposeCredentialHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: CredentialResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: CredentialService + 'static> Handler for ProposeCredentialHandler<TService> {
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
            .accept_proposal(AcceptProposalOptions::new(&record.id()))
            .await?;
        reply(result)
    }
}

pub struct OfferCredentialHandler<TService: CredentialService> {
    service: Arc<TService>,
    coordinator: CredentialResponseCoordinator,
}

impl<TService: CredentialService> OfferCredentialHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: CredentialResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: CredentialService + 'static> Handler for OfferCredentialHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::OfferMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_offer(ctx.into_typed()?).await?;
        processed("offer", &record);

        let previews = self.service.find_previews(&record).await?;
        if !self.coordinator.should_auto_respond_to_offer(&record, &previews) {
            return Ok(None);
        }

        let result = self
            .service
            .create_request(record, RequestCredentialOptions::default())
            .await?;
        reply(result)
    }
}

pub struct RequestCredentialHandler<TService: CredentialService> {
    service: Arc<TService>,
    coordinator: CredentialResponseCoordinator,
}

impl<TService: CredentialService> RequestCredentialHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: CredentialResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: CredentialService + 'static> Handler for RequestCredentialHandler<TService> {
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
            .accept_request(AcceptRequestOptions::new(&record.id()))
            .await?;
        reply(result)
    }
}

pub struct IssueCredentialHandler<TService: CredentialService> {
    service: Arc<TService>,
    coordinator: CredentialResponseCoordinator,
}

impl<TService: CredentialService> IssueCredentialHandler<TService> {
    pub fn new(service: Arc<TService>, coordinator: CredentialResponseCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }
}

#[async_trait]
impl<TService: CredentialService + 'static> Handler for IssueCredentialHandler<TService> {
    fn supported_message_types(&self) -> Vec<&'static str> {
        vec![<TService::IssueMessage as AgentMessage>::MESSAGE_TYPE]
    }

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let record = self.service.process_credential(ctx.into_typed()?).await?;
        processed("credential", &record);

        let previews = self.service.find_previews(&record).await?;
        if !self
            .coordinator
            .should_auto_respond_to_credential(&record, &previews)
        {
            return Ok(None);
        }

        let result = self.service.create_ack(record).await?;
        reply(result)
    }
}

/// `CredentialAckHandler` closes the issuer side, an ack never gets a reply
pub struct CredentialAckHandler<TService: CredentialService> {
    service: Arc<TService>,
}

impl<TService: CredentialService> CredentialAckHandler<TService> {
    pub fn new(service: Arc<TService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<TService: CredentialService + 'static> Handler for CredentialAckHandler<TService> {
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
