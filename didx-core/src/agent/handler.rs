use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::debug;

use super::context::{InboundMessageContext, OutboundMessage};
use super::types::AgentError;

/// `Handler` binds one or more inbound message types to the protocol service call that
/// processes them
///
/// A handler returns the outbound reply when it decided to respond automatically
#[async_trait]
pub trait Handler: Send + Sync {
    fn supported_message_types(&self) -> Vec<&'static str>;

    async fn handle(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError>;
}

/// `Dispatcher` routes a decrypted plaintext message to the handler registered for its
/// `@type`
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn supported_message_types(&self) -> Vec<&'static str> {
        self.handlers
            .iter()
            .flat_map(|handler| handler.supported_message_types())
            .collect()
    }

    fn find_handler(&self, message_type: &str) -> Option<Arc<dyn Handler>> {
        self.handlers
            .iter()
            .find(|handler| handler.supported_message_types().contains(&message_type))
            .cloned()
    }

    pub async fn dispatch(
        &self,
        ctx: InboundMessageContext<Value>,
    ) -> Result<Option<OutboundMessage>, AgentError> {
        let message_type = ctx
            .message_type()
            .map(|typ| typ.to_string())
            .ok_or_else(|| AgentError::MalformedMessage("missing @type".to_string()))?;

        let handler = self
            .find_handler(&message_type)
            .ok_or_else(|| AgentError::UnsupportedMessageType(message_type.clone()))?;

        debug!("[dispatcher] handling message type: {message_type}");
        handler.handle(ctx).await
    }
}
