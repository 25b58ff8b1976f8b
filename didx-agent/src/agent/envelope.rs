use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;

use didx_core::agent::{AgentError, InboundMessageContext, OutboundMessage};
use didx_core::transport::{EncryptedMessage, OutboundPackage};

/// `DecryptedMessage` is an unpacked envelope together with what the envelope revealed
/// about its sender
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedMessage {
    pub plaintext: Value,
    pub connection_id: Option<String>,
    pub sender_key: Option<String>,
    pub recipient_key: Option<String>,
}

impl DecryptedMessage {
    pub fn into_context(self) -> InboundMessageContext<Value> {
        InboundMessageContext::new(self.plaintext, self.connection_id)
            .with_keys(self.sender_key, self.recipient_key)
    }
}

/// `EnvelopeService` packs and unpacks DIDComm envelopes
///
/// Packing resolves the connection of the outbound message into the endpoint and keys
/// of the peer, the encryption itself belongs to the wallet behind it.
#[async_trait]
pub trait EnvelopeService: Send + Sync {
    async fn unpack(&self, message: EncryptedMessage) -> Result<DecryptedMessage, AgentError>;
    async fn pack(&self, message: &OutboundMessage) -> Result<OutboundPackage, AgentError>;
}
