use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("envelope error: {0}")]
    EnvelopeError(String),

    #[error("transport error: {0}")]
    TransportError(String),
}
