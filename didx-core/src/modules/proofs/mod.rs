//! `proofs` drives the present-proof 1.0 protocol between a prover and a verifier
pub mod coordinator;
pub mod exchange;
pub mod handlers;
pub mod options;
pub mod record;
pub mod repository;
pub mod service;
pub mod types;
pub mod v1;

pub use coordinator::ProofResponseCoordinator;
pub use exchange::{ProofExchange, ProofStorage};
pub use record::ProofExchangeRecord;
pub use repository::ProofRepository;
pub use service::ProofService;
pub use types::{AutoAcceptProof, ProofError, ProofRole, ProofState};
