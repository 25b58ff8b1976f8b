use rst_common::standard::serde_json::Value;

use super::message::AgentMessage;
use super::types::AgentError;

/// `InboundMessageContext` wraps a decrypted inbound message with the transport facts
/// known about it
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessageContext<TMessage> {
    pub message: TMessage,
    pub connection_id: Option<String>,
    pub sender_key: Option<String>,
    pub recipient_key: Option<String>,
}

impl<TMessage> InboundMessageContext<TMessage> {
    pub fn new(message: TMessage, connection_id: Option<String>) -> Self {
        Self {
            message,
            connection_id,
            sender_key: None,
            recipient_key: None,
        }
    }

    pub fn with_keys(mut self, sender_key: Option<String>, recipient_key: Option<String>) -> Self {
        self.sender_key = sender_key;
        self.recipient_key = recipient_key;
        self
    }
}

impl InboundMessageContext<Value> {
    pub fn message_type(&self) -> Option<&str> {
        self.message.get("@type").and_then(|typ| typ.as_str())
    }

    /// `into_typed` decodes the plaintext message into its typed form, keeping the
    /// transport facts
    pub fn into_typed<TMessage: AgentMessage>(
        self,
    ) -> Result<InboundMessageContext<TMessage>, AgentError> {
        let message = TMessage::from_value(self.message)?;

        Ok(InboundMessageContext {
            message,
            connection_id: self.connection_id,
            sender_key: self.sender_key,
            recipient_key: self.recipient_key,
        })
    }
}

/// `OutboundMessage` is a plaintext message addressed to a connection, packing it into
/// an encrypted envelope belongs to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub connection_id: Option<String>,
    pub thread_id: String,
    pub message_type: String,
    pub payload: Value,
}

impl OutboundMessage {
    pub fn create<TMessage: AgentMessage>(
        connection_id: Option<String>,
        message: &TMessage,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            connection_id,
            thread_id: message.thread_id(),
            message_type: TMessage::MESSAGE_TYPE.to_string(),
            payload: message.to_value()?,
        })
    }
}
