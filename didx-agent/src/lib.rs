//! `didx-agent` is the runtime of a DIDx agent: TOML configuration, RocksDB record
//! storage and the [`agent::Agent`] that wires the protocol services of `didx-core`
//! to an outbound transport
pub mod agent;
pub mod common;
pub mod config;
pub mod storage;
