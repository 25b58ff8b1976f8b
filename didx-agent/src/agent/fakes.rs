use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_tokio::tokio::sync::{Mutex, RwLock};

use didx_core::agent::{AgentError, OutboundMessage};
use didx_core::modules::credentials::types::CredentialPreviewAttribute;
use didx_core::transport::{
    EncryptedMessage, InboundMessageReceiver, OutboundPackage, OutboundTransport, TransportError,
};
use didx_core::wallet::{CredentialWallet, ProofWallet, WalletError};

use super::{DecryptedMessage, EnvelopeService};

/// Wallet answering every call with a fixed payload
#[derive(Default)]
pub struct FakeWallet;

#[async_trait]
impl CredentialWallet for FakeWallet {
    async fn create_indy_offer(
        &self,
        credential_definition_id: String,
    ) -> Result<Value, WalletError> {
        Ok(json!({"cred_def_id": credential_definition_id, "nonce": "1"}))
    }

    async fn create_indy_request(
        &self,
        holder_did: Option<String>,
        _offer: Value,
    ) -> Result<Value, WalletError> {
        Ok(json!({"prover_did": holder_did, "nonce": "2"}))
    }

    async fn create_indy_credential(
        &self,
        _offer: Value,
        _request: Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<Value, WalletError> {
        let names: Vec<String> = attributes.iter().map(|attr| attr.name.clone()).collect();
        Ok(json!({"values": names}))
    }

    async fn store_indy_credential(&self, _credential: Value) -> Result<String, WalletError> {
        Ok("stored-indy-credential".to_string())
    }

    async fn sign_w3c_credential(
        &self,
        credential: Value,
        _proof_type: String,
    ) -> Result<Value, WalletError> {
        Ok(credential)
    }

    async fn store_w3c_credential(&self, _credential: Value) -> Result<String, WalletError> {
        Ok("stored-w3c-credential".to_string())
    }
}

#[async_trait]
impl ProofWallet for FakeWallet {
    async fn create_presentation(&self, proof_request: Value) -> Result<Value, WalletError> {
        Ok(json!({"proof_request": proof_request}))
    }

    async fn verify_presentation(
        &self,
        _proof_request: Value,
        _presentation: Value,
    ) -> Result<bool, WalletError> {
        Ok(true)
    }
}

/// Envelope keeping the plaintext as the ciphertext, every inbound message is
/// attributed to one connection
pub struct FakeEnvelope {
    connection_id: String,
}

impl FakeEnvelope {
    pub fn new(connection_id: &str) -> Self {
        Self {
            connection_id: connection_id.to_string(),
        }
    }
}

#[async_trait]
impl EnvelopeService for FakeEnvelope {
    async fn unpack(&self, message: EncryptedMessage) -> Result<DecryptedMessage, AgentError> {
        let plaintext = serde_json::from_str(&message.ciphertext)
            .map_err(|err| AgentError::EnvelopeError(err.to_string()))?;

        Ok(DecryptedMessage {
            plaintext,
            connection_id: Some(self.connection_id.clone()),
            sender_key: None,
            recipient_key: None,
        })
    }

    async fn pack(&self, message: &OutboundMessage) -> Result<OutboundPackage, AgentError> {
        let envelope = EncryptedMessage {
            protected: "fake".to_string(),
            iv: "iv".to_string(),
            ciphertext: message.payload.to_string(),
            tag: "tag".to_string(),
        };

        Ok(OutboundPackage::new(envelope, Some("http://peer.example.com".to_string())))
    }
}

/// Transport handing every package straight to a connected peer agent
#[derive(Default)]
pub struct LoopbackTransport {
    peer: RwLock<Option<Arc<dyn InboundMessageReceiver>>>,
    pub sent: Mutex<Vec<EncryptedMessage>>,
}

impl LoopbackTransport {
    pub async fn connect(&self, peer: Arc<dyn InboundMessageReceiver>) {
        let mut current = self.peer.write().await;
        *current = Some(peer);
    }
}

#[async_trait]
impl OutboundTransport for LoopbackTransport {
    fn supported_schemes(&self) -> Vec<&'static str> {
        vec!["http"]
    }

    async fn start(
        &self,
        _receiver: Arc<dyn InboundMessageReceiver>,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut current = self.peer.write().await;
        *current = None;
        Ok(())
    }

    async fn send_message(&self, package: OutboundPackage) -> Result<(), TransportError> {
        self.sent.lock().await.push(package.payload.clone());

        let peer = self.peer.read().await.clone();
        match peer {
            Some(peer) => peer
                .receive_message(package.payload)
                .await
                .map_err(|err| TransportError::DeliveryError {
                    endpoint: package.endpoint.unwrap_or_default(),
                    cause: err.to_string(),
                }),
            None => Ok(()),
        }
    }
}
