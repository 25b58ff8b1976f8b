//! `storage` is the record store: the persisted entity contract, tag queries, a typed
//! repository facade and the DIDComm message repository built on top of it
pub mod didcomm;
pub mod memory;
pub mod record;
pub mod repository;
pub mod types;

pub use memory::InMemoryStorage;
pub use record::BaseRecord;
pub use repository::Repository;
pub use types::{Query, Record, StorageError, StorageService, StoredRecord, TagValue, Tags};
