//! `storage` is the RocksDB backed record store of the agent
mod builder;
pub use builder::Builder;

mod rocks;
pub use rocks::RocksStorage;
