//! `routing` keeps the mediation agreements an agent holds with its mediators
pub mod record;
pub mod repository;
pub mod types;

pub use record::MediationRecord;
pub use repository::MediationRepository;
pub use types::{MediationError, MediationRole, MediationState};
