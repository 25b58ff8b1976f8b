use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::with_errors::thiserror::{self, Error};

use crate::agent::types::AgentError;
use crate::modules::dids::DidDocumentService;

#[derive(Debug, PartialEq, Error, Clone)]
pub enum TransportError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("delivery to {endpoint} failed: {cause}")]
    DeliveryError { endpoint: String, cause: String },

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}

/// `EncryptedMessage` is the JWE shaped envelope exchanged between agents
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct EncryptedMessage {
    pub protected: String,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

impl EncryptedMessage {
    /// `from_value` accepts only a JSON object carrying every envelope field as a string
    pub fn from_value(value: Value) -> Result<Self, TransportError> {
        let obj = value
            .as_object()
            .ok_or(TransportError::InvalidEnvelope("not a json object".to_string()))?;

        for field in ["protected", "iv", "ciphertext", "tag"] {
            match obj.get(field) {
                Some(Value::String(_)) => continue,
                Some(_) => {
                    return Err(TransportError::InvalidEnvelope(format!(
                        "field {} must be a string",
                        field
                    )))
                }
                None => {
                    return Err(TransportError::InvalidEnvelope(format!(
                        "missing field {}",
                        field
                    )))
                }
            }
        }

        serde_json::from_value(value)
            .map_err(|err| TransportError::InvalidEnvelope(err.to_string()))
    }

    pub fn to_value(&self) -> Result<Value, TransportError> {
        serde_json::to_value(self).map_err(|err| TransportError::InvalidEnvelope(err.to_string()))
    }
}

/// `OutboundPackage` is an envelope ready for delivery
///
/// `response_requested` marks that the sender asked the peer for return routing, in that
/// case the peer answers on the same connection
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundPackage {
    pub payload: EncryptedMessage,
    pub endpoint: Option<String>,
    pub response_requested: bool,
    pub connection_id: Option<String>,
}

impl OutboundPackage {
    pub fn new(payload: EncryptedMessage, endpoint: Option<String>) -> Self {
        Self {
            payload,
            endpoint,
            response_requested: false,
            connection_id: None,
        }
    }

    pub fn for_service(payload: EncryptedMessage, service: &DidDocumentService) -> Self {
        Self::new(payload, Some(service.service_endpoint()))
    }

    pub fn with_response_requested(mut self, response_requested: bool) -> Self {
        self.response_requested = response_requested;
        self
    }

    pub fn with_connection(mut self, connection_id: &str) -> Self {
        self.connection_id = Some(connection_id.to_string());
        self
    }
}

/// `InboundMessageReceiver` is the agent entry point for envelopes arriving on any
/// channel, including the response body of an outbound delivery
#[async_trait]
pub trait InboundMessageReceiver: Send + Sync {
    async fn receive_message(&self, message: EncryptedMessage) -> Result<(), AgentError>;
}

#[async_trait]
pub trait OutboundTransport: Send + Sync {
    fn supported_schemes(&self) -> Vec<&'static str>;

    async fn start(&self, receiver: Arc<dyn InboundMessageReceiver>) -> Result<(), TransportError>;
    async fn stop(&self) -> Result<(), TransportError>;
    async fn send_message(&self, package: OutboundPackage) -> Result<(), TransportError>;
}
