use rst_common::with_errors::thiserror::{self, Error};

use crate::modules::credentials::types::CredentialError;
use crate::modules::proofs::types::ProofError;
use crate::storage::StorageError;
use crate::transport::types::TransportError;

/// `AgentError` is the error surfaced by inbound processing: message decoding, dispatch
/// and the protocol errors of the handler that processed the message
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("unsupported message type: {0}")]
    UnsupportedMessageType(String),

    #[error("unexpected message type: expected {expected}, found {actual}")]
    UnexpectedMessageType { expected: String, actual: String },

    #[error("invalid message type: {0}")]
    InvalidMessageType(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("credential error: {0}")]
    CredentialError(#[from] CredentialError),

    #[error("proof error: {0}")]
    ProofError(#[from] ProofError),

    #[error("transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("envelope error: {0}")]
    EnvelopeError(String),
}
