//! `modules` groups the protocol modules the agent speaks
pub mod connections;
pub mod credentials;
pub mod dids;
pub mod proofs;
pub mod routing;
