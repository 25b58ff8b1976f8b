mod record;
mod repository;

pub use record::{DidCommMessageRecord, DidCommMessageRole};
pub use repository::{DidCommMessageRepository, SavedAgentMessage};
