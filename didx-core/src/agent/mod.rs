//! `agent` holds the pieces shared by every protocol module: the typed message contract,
//! inbound and outbound message contexts, the agent configuration and the handler
//! dispatch
pub mod config;
pub mod context;
pub mod handler;
pub mod message;
pub mod types;

pub use config::{AgentConfig, DidCommMimeType};
pub use context::{InboundMessageContext, OutboundMessage};
pub use handler::{Dispatcher, Handler};
pub use message::{AgentMessage, Attachment, MessageHeader, MessageType, ThreadDecorator};
pub use types::AgentError;
