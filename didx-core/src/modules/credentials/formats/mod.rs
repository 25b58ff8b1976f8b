//! `formats` shapes the attachments of credential messages. The protocol version picks
//! the state machine, the format picks the payload
pub mod indy;
pub mod types;
pub mod w3c;

pub use indy::IndyCredentialFormatService;
pub use types::{CredentialFormatService, CredentialFormatSpec, FormatAttachment};
pub use w3c::W3cCredentialFormatService;
