//! `transport` delivers encrypted envelopes to other agents
pub mod http;
pub mod types;

pub use http::HttpOutboundTransport;
pub use types::{
    EncryptedMessage, InboundMessageReceiver, OutboundPackage, OutboundTransport, TransportError,
};
