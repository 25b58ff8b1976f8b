//! `didx-core` is the DIDComm protocol exchange engine: persisted exchange records guarded
//! by explicit state machines, the message store that keeps the latest message of each
//! type per conversation, versioned credential and proof protocol services and the
//! outbound HTTP transport
pub mod agent;
pub mod modules;
pub mod storage;
pub mod transport;
pub mod wallet;
