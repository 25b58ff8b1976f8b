use std::collections::BTreeMap;
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_tokio::tokio::sync::RwLock;

use super::types::{Query, Record, StorageError, StorageService, StoredRecord, Tags};

type RecordKey = (String, String);

/// `InMemoryStorage` keeps every record type in a single shared map, cloning the storage
/// shares the same map
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    records: Arc<RwLock<BTreeMap<RecordKey, StoredRecord>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_key<T: Record>(id: String) -> RecordKey {
        (T::RECORD_TYPE.to_string(), id)
    }

    fn not_found<T: Record>(id: String) -> StorageError {
        StorageError::RecordNotFound {
            record_type: T::RECORD_TYPE.to_string(),
            query: Tags::new().with("id", id).describe(),
        }
    }
}

#[async_trait]
impl<T> StorageService<T> for InMemoryStorage
where
    T: Record,
{
    async fn save(&self, record: &T) -> Result<(), StorageError> {
        let stored = StoredRecord::from_record(record)?;
        let key = Self::build_key::<T>(record.id());

        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(StorageError::RecordDuplicate {
                record_type: T::RECORD_TYPE.to_string(),
                query: Tags::new().with("id", record.id()).describe(),
            });
        }

        records.insert(key, stored);
        Ok(())
    }

    async fn update(&self, record: &T) -> Result<(), StorageError> {
        let stored = StoredRecord::from_record(record)?;
        let key = Self::build_key::<T>(record.id());

        let mut records = self.records.write().await;
        if !records.contains_key(&key) {
            return Err(Self::not_found::<T>(record.id()));
        }

        records.insert(key, stored);
        Ok(())
    }

    async fn delete(&self, record: &T) -> Result<(), StorageError> {
        let key = Self::build_key::<T>(record.id());
        let mut records = self.records.write().await;

        records
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| Self::not_found::<T>(record.id()))
    }

    async fn get_by_id(&self, id: String) -> Result<T, StorageError> {
        let key = Self::build_key::<T>(id.clone());
        let records = self.records.read().await;

        records
            .get(&key)
            .ok_or_else(|| Self::not_found::<T>(id))?
            .to_record()
    }

    async fn get_all(&self) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().await;

        records
            .values()
            .filter(|stored| stored.record_type == T::RECORD_TYPE)
            .map(|stored| stored.to_record())
            .collect()
    }

    async fn find_by_query(&self, query: &Query) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().await;

        records
            .values()
            .filter(|stored| stored.record_type == T::RECORD_TYPE)
            .filter(|stored| query.matches(&stored.tags))
            .map(|stored| stored.to_record())
            .collect()
    }
}
