pub mod messages;
pub mod service;

pub use messages::{
    V1CredentialAckMessage, V1IssueCredentialMessage, V1OfferCredentialMessage,
    V1ProposeCredentialMessage, V1RequestCredentialMessage,
};
pub use service::V1CredentialService;
