pub mod messages;
pub mod service;

pub use messages::{
    V1PresentationAckMessage, V1PresentationMessage, V1ProposePresentationMessage,
    V1RequestPresentationMessage,
};
pub use service::V1ProofService;
