pub mod messages;
pub mod service;

pub use messages::{
    FormattedAttachments, V2CredentialAckMessage, V2IssueCredentialMessage,
    V2OfferCredentialMessage, V2ProposeCredentialMessage, V2RequestCredentialMessage,
};
pub use service::V2CredentialService;
