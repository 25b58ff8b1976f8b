use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, Value};
use rst_common::with_logging::log::{debug, error, info, warn};
use rst_common::with_tokio::tokio::sync::RwLock;
use rst_common::with_tokio::tokio::time::timeout;

use crate::agent::config::{AgentConfig, DidCommMimeType};

use super::types::{
    EncryptedMessage, InboundMessageReceiver, OutboundPackage, OutboundTransport, TransportError,
};

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// `HttpOutboundTransport` posts envelopes to HTTP endpoints and feeds any envelope
/// returned in the response body back to the agent
pub struct HttpOutboundTransport {
    client: Client,
    mime_type: DidCommMimeType,
    timeout: Duration,
    receiver: RwLock<Option<Arc<dyn InboundMessageReceiver>>>,
}

impl HttpOutboundTransport {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: Client::new(),
            mime_type: config.did_comm_mime_type(),
            timeout: config.outbound_timeout(),
            receiver: RwLock::new(None),
        }
    }

    fn assert_scheme(&self, endpoint: &str) -> Result<(), TransportError> {
        let scheme = endpoint.split(':').next().unwrap_or_default();
        if self.supported_schemes().contains(&scheme) {
            return Ok(());
        }

        Err(TransportError::UnsupportedScheme(scheme.to_string()))
    }

    async fn deliver(&self, endpoint: &str, body: String) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, self.mime_type.as_str())
            .body(body)
            .send()
            .await?;

        info!(
            "[transport:send] endpoint: {} | status: {}",
            endpoint,
            response.status()
        );
        response.text().await
    }

    async fn handle_response(&self, receiver: Arc<dyn InboundMessageReceiver>, body: String) {
        if body.trim().is_empty() {
            debug!("[transport:response] empty response body");
            return;
        }

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => {
                warn!("[transport:response] response body is not json: {}", err);
                return;
            }
        };

        let envelope = match EncryptedMessage::from_value(value) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("[transport:response] dropping response: {}", err);
                return;
            }
        };

        if let Err(err) = receiver.receive_message(envelope).await {
            error!("[transport:response] inbound processing failed: {}", err);
        }
    }
}

#[async_trait]
impl OutboundTransport for HttpOutboundTransport {
    fn supported_schemes(&self) -> Vec<&'static str> {
        SUPPORTED_SCHEMES.to_vec()
    }

    async fn start(&self, receiver: Arc<dyn InboundMessageReceiver>) -> Result<(), TransportError> {
        let mut current = self.receiver.write().await;
        *current = Some(receiver);

        info!("[transport:start] http outbound transport started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut current = self.receiver.write().await;
        *current = None;

        info!("[transport:stop] http outbound transport stopped");
        Ok(())
    }

    async fn send_message(&self, package: OutboundPackage) -> Result<(), TransportError> {
        let endpoint = package.endpoint.clone().ok_or(TransportError::ConfigurationError(
            "missing outbound endpoint".to_string(),
        ))?;
        self.assert_scheme(&endpoint)?;

        let receiver = self
            .receiver
            .read()
            .await
            .clone()
            .ok_or(TransportError::ConfigurationError(
                "transport has not been started".to_string(),
            ))?;

        let body = serde_json::to_string(&package.payload).map_err(|err| {
            TransportError::DeliveryError {
                endpoint: endpoint.clone(),
                cause: err.to_string(),
            }
        })?;

        debug!(
            "[transport:send] endpoint: {} | connection: {:?} | response requested: {}",
            endpoint, package.connection_id, package.response_requested
        );

        let response_body = match timeout(self.timeout, self.deliver(&endpoint, body)).await {
            Ok(result) => result.map_err(|err| TransportError::DeliveryError {
                endpoint: endpoint.clone(),
                cause: err.to_string(),
            })?,
            Err(_) if !package.response_requested => {
                debug!(
                    "[transport:send] endpoint: {} | closed after {}ms without response",
                    endpoint,
                    self.timeout.as_millis()
                );
                return Ok(());
            }
            Err(_) => {
                return Err(TransportError::DeliveryError {
                    endpoint,
                    cause: format!("no response after {}ms", self.timeout.as_millis()),
                })
            }
        };

        self.handle_response(receiver, response_body).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockall::mock;
    use mockito::{Matcher, Server};

    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;
    use rst_common::with_tokio::tokio::io::AsyncReadExt;
    use rst_common::with_tokio::tokio::net::TcpListener;

    use crate::agent::types::AgentError;

    mock!(
        FakeReceiver{}

        #[async_trait]
        impl InboundMessageReceiver for FakeReceiver {
            async fn receive_message(&self, message: EncryptedMessage) -> Result<(), AgentError>;
        }
    );

    fn generate_envelope() -> EncryptedMessage {
        EncryptedMessage {
            protected: "protected".to_string(),
            iv: "iv".to_string(),
            ciphertext: "ciphertext".to_string(),
            tag: "tag".to_string(),
        }
    }

    async fn generate_transport(
        config: AgentConfig,
        receiver: MockFakeReceiver,
    ) -> HttpOutboundTransport {
        let transport = HttpOutboundTransport::new(&config);
        transport.start(Arc::new(receiver)).await.unwrap();
        transport
    }

    /// binds a peer that accepts the connection and never answers
    async fn generate_silent_peer() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    while let Ok(read) = socket.read(&mut buf).await {
                        if read == 0 {
                            break;
                        }
                    }
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_send_missing_endpoint() {
        let transport = generate_transport(AgentConfig::default(), MockFakeReceiver::new()).await;

        let result = transport
            .send_message(OutboundPackage::new(generate_envelope(), None))
            .await;
        assert!(matches!(
            result,
            Err(TransportError::ConfigurationError(_))
        ))
    }

    #[tokio::test]
    async fn test_send_unsupported_scheme() {
        let transport = generate_transport(AgentConfig::default(), MockFakeReceiver::new()).await;

        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some("ws://agent.example.com".to_string()),
            ))
            .await;
        assert_eq!(
            result,
            Err(TransportError::UnsupportedScheme("ws".to_string()))
        )
    }

    #[tokio::test]
    async fn test_send_before_start() {
        let transport = HttpOutboundTransport::new(&AgentConfig::default());

        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some("http://127.0.0.1:1".to_string()),
            ))
            .await;
        assert!(matches!(
            result,
            Err(TransportError::ConfigurationError(_))
        ))
    }

    #[tokio::test]
    async fn test_send_forwards_response_envelope() {
        let mut server = Server::new_async().await;
        let response = generate_envelope().to_value().unwrap();

        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/ssi-agent-wire")
            .match_body(Matcher::Json(generate_envelope().to_value().unwrap()))
            .with_status(200)
            .with_body(response.to_string())
            .create_async()
            .await;

        let mut receiver = MockFakeReceiver::new();
        receiver
            .expect_receive_message()
            .withf(|message| message.ciphertext == "ciphertext")
            .times(1)
            .returning(|_| Ok(()));

        let transport = generate_transport(AgentConfig::default(), receiver).await;
        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some(format!("{}/", server.url())),
            ))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_uses_configured_mime_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/didcomm-envelope-enc")
            .with_status(202)
            .create_async()
            .await;

        let config = AgentConfig::default().with_did_comm_mime_type(DidCommMimeType::V1);
        let mut receiver = MockFakeReceiver::new();
        receiver.expect_receive_message().times(0);

        let transport = generate_transport(config, receiver).await;
        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some(format!("{}/", server.url())),
            ))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_drops_invalid_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(json!({"protected": "p", "ciphertext": 1}).to_string())
            .create_async()
            .await;

        let mut receiver = MockFakeReceiver::new();
        receiver.expect_receive_message().times(0);

        let transport = generate_transport(AgentConfig::default(), receiver).await;
        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some(format!("{}/", server.url())),
            ))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_tolerates_receiver_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(generate_envelope().to_value().unwrap().to_string())
            .create_async()
            .await;

        let mut receiver = MockFakeReceiver::new();
        receiver
            .expect_receive_message()
            .times(1)
            .returning(|_| Err(AgentError::MalformedMessage("cannot unpack".to_string())));

        let transport = generate_transport(AgentConfig::default(), receiver).await;
        let result = transport
            .send_message(OutboundPackage::new(
                generate_envelope(),
                Some(format!("{}/", server.url())),
            ))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_timeout_without_response_requested() {
        let endpoint = generate_silent_peer().await;
        let config = AgentConfig::default().with_outbound_timeout(Duration::from_millis(200));

        let mut receiver = MockFakeReceiver::new();
        receiver.expect_receive_message().times(0);

        let transport = generate_transport(config, receiver).await;
        let result = transport
            .send_message(OutboundPackage::new(generate_envelope(), Some(endpoint)))
            .await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_timeout_with_response_requested() {
        let endpoint = generate_silent_peer().await;
        let config = AgentConfig::default().with_outbound_timeout(Duration::from_millis(200));

        let transport = generate_transport(config, MockFakeReceiver::new()).await;
        let result = transport
            .send_message(
                OutboundPackage::new(generate_envelope(), Some(endpoint.clone()))
                    .with_response_requested(true),
            )
            .await;
        assert!(matches!(
            result,
            Err(TransportError::DeliveryError { endpoint: found, .. }) if found == endpoint
        ))
    }

    #[tokio::test]
    async fn test_send_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = generate_transport(AgentConfig::default(), MockFakeReceiver::new()).await;
        let result = transport
            .send_message(OutboundPackage::new(generate_envelope(), Some(endpoint)))
            .await;
        assert!(matches!(result, Err(TransportError::DeliveryError { .. })))
    }
}
