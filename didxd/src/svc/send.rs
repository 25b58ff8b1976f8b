use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, Value};
use rst_common::with_logging::log::info;
use rst_common::with_tokio::tokio;

use didx_core::agent::{AgentConfig, AgentError};
use didx_core::transport::{
    EncryptedMessage, HttpOutboundTransport, InboundMessageReceiver, OutboundPackage,
    OutboundTransport,
};

use crate::errors::DaemonError;

/// `ResponsePrinter` writes envelopes returned on the outbound connection to stdout,
/// the daemon holds no keys to unpack them
pub struct ResponsePrinter;

#[async_trait]
impl InboundMessageReceiver for ResponsePrinter {
    async fn receive_message(&self, message: EncryptedMessage) -> Result<(), AgentError> {
        let output = serde_json::to_string_pretty(&message)
            .map_err(|err| AgentError::MalformedMessage(err.to_string()))?;

        println!("{}", output);
        Ok(())
    }
}

/// `Delivery` posts a single envelope file through the HTTP outbound transport
pub struct Delivery {
    config: AgentConfig,
    endpoint: String,
    response_requested: bool,
}

impl Delivery {
    pub fn new(config: AgentConfig, endpoint: String) -> Self {
        Self {
            config,
            endpoint,
            response_requested: false,
        }
    }

    pub fn with_response_requested(mut self, response_requested: bool) -> Self {
        self.response_requested = response_requested;
        self
    }

    pub async fn load_envelope(file: &str) -> Result<EncryptedMessage, DaemonError> {
        let content = tokio::fs::read_to_string(file)
            .await
            .map_err(|err| DaemonError::EnvelopeError(err.to_string()))?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|err| DaemonError::EnvelopeError(err.to_string()))?;

        EncryptedMessage::from_value(value)
            .map_err(|err| DaemonError::EnvelopeError(err.to_string()))
    }

    pub async fn run(
        &self,
        envelope: EncryptedMessage,
        receiver: Arc<dyn InboundMessageReceiver>,
    ) -> Result<(), DaemonError> {
        let transport = HttpOutboundTransport::new(&self.config);
        transport
            .start(receiver)
            .await
            .map_err(|err| DaemonError::TransportError(err.to_string()))?;

        let package = OutboundPackage::new(envelope, Some(self.endpoint.to_owned()))
            .with_response_requested(self.response_requested);

        let result = transport
            .send_message(package)
            .await
            .map_err(|err| DaemonError::TransportError(err.to_string()));

        transport
            .stop()
            .await
            .map_err(|err| DaemonError::TransportError(err.to_string()))?;

        result?;
        info!("[didxd:send] envelope delivered to {}", self.endpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    use mockall::mock;
    use mockito::Server;

    mock!(
        FakeReceiver{}

        #[async_trait]
        impl InboundMessageReceiver for FakeReceiver {
            async fn receive_message(&self, message: EncryptedMessage) -> Result<(), AgentError>;
        }
    );

    fn fixture(name: &str) -> String {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/svc/fixtures");
        format!("{}/{}", path.display(), name)
    }

    #[tokio::test]
    async fn test_load_envelope() {
        let envelope = Delivery::load_envelope(&fixture("envelope.json")).await.unwrap();
        assert_eq!(envelope.ciphertext, "Zm9vYmFy");

        let invalid = Delivery::load_envelope(&fixture("config.toml")).await;
        assert!(matches!(invalid, Err(DaemonError::EnvelopeError(_))))
    }

    #[tokio::test]
    async fn test_deliver_envelope() {
        let envelope = Delivery::load_envelope(&fixture("envelope.json")).await.unwrap();

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/inbound")
            .match_header("content-type", "application/ssi-agent-wire")
            .with_status(200)
            .with_body(serde_json::to_string(&envelope).unwrap())
            .create_async()
            .await;

        let mut receiver = MockFakeReceiver::new();
        receiver
            .expect_receive_message()
            .withf(|message| message.tag == "sT2vXm6Qe8kJ4uPl")
            .times(1)
            .returning(|_| Ok(()));

        let delivery = Delivery::new(AgentConfig::new("didxd"), format!("{}/inbound", server.url()))
            .with_response_requested(true);
        let result = delivery.run(envelope, Arc::new(receiver)).await;

        mock.assert_async().await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_deliver_unsupported_endpoint() {
        let envelope = Delivery::load_envelope(&fixture("envelope.json")).await.unwrap();

        let delivery = Delivery::new(AgentConfig::new("didxd"), "ws://127.0.0.1:9000".to_string());
        let result = delivery.run(envelope, Arc::new(ResponsePrinter)).await;
        assert!(matches!(result, Err(DaemonError::TransportError(msg)) if msg.contains("ws")))
    }
}
