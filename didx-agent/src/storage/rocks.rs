use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::Mutex;

use rstdev_storage::engine::rocksdb::executor::Executor;
use rstdev_storage::engine::rocksdb::types::{
    Instruction as DbInstruction, OutputOpts as DbOutput,
};

use didx_core::storage::{Query, Record, StorageError, StorageService, StoredRecord, Tags};

const RECORD_KEY_PREFIX: &str = "record";
const INDEX_KEY_PREFIX: &str = "index";

/// `RocksStorage` keeps records in a single RocksDB column family
///
/// A record lives under `record:{type}:{id}`, and the ids of each record type are listed
/// under `index:{type}` so the whole type can be loaded with one multi get. Writes are
/// serialized by a lock shared between clones. An id is indexed before its record is
/// written and unindexed after its record is removed, so a failed write never leaves a
/// record that queries cannot reach.
#[derive(Clone)]
pub struct RocksStorage {
    db: Executor,
    index_lock: Arc<Mutex<()>>,
}

impl RocksStorage {
    pub fn new(db: Executor) -> Self {
        Self {
            db,
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    fn build_record_key(record_type: &str, id: &str) -> String {
        format!("{}:{}:{}", RECORD_KEY_PREFIX, record_type, id)
    }

    fn build_index_key(record_type: &str) -> String {
        format!("{}:{}", INDEX_KEY_PREFIX, record_type)
    }

    fn not_found(record_type: &str, id: String) -> StorageError {
        StorageError::RecordNotFound {
            record_type: record_type.to_string(),
            query: Tags::new().with("id", id).describe(),
        }
    }

    async fn get_bytes(&self, key: String) -> Result<Option<Vec<u8>>, StorageError> {
        let output = self
            .db
            .exec(DbInstruction::GetCf { key })
            .await
            .map_err(|err| StorageError::DbError(err.to_string()))?;

        match output {
            DbOutput::SingleByte { value } => Ok(value),
            _ => Err(StorageError::DbError("unknown output type".to_string())),
        }
    }

    async fn put_bytes(&self, key: String, value: Vec<u8>) -> Result<(), StorageError> {
        let _ = self
            .db
            .exec(DbInstruction::SaveCf { key, value })
            .await
            .map_err(|err| StorageError::DbError(err.to_string()))?;

        Ok(())
    }

    async fn remove_key(&self, key: String) -> Result<(), StorageError> {
        let _ = self
            .db
            .exec(DbInstruction::RemoveCf { key })
            .await
            .map_err(|err| StorageError::DbError(err.to_string()))?;

        Ok(())
    }

    async fn get_stored(
        &self,
        record_type: &str,
        id: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let key = Self::build_record_key(record_type, id);
        self.get_bytes(key)
            .await?
            .map(StoredRecord::try_from)
            .transpose()
    }

    async fn put_stored(&self, stored: StoredRecord) -> Result<(), StorageError> {
        let key = Self::build_record_key(&stored.record_type, &stored.id);
        let value: Vec<u8> = stored.try_into()?;
        self.put_bytes(key, value).await
    }

    async fn load_index(&self, record_type: &str) -> Result<Vec<String>, StorageError> {
        match self.get_bytes(Self::build_index_key(record_type)).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| StorageError::UnserializeError(err.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn store_index(&self, record_type: &str, ids: &[String]) -> Result<(), StorageError> {
        let value =
            serde_json::to_vec(ids).map_err(|err| StorageError::SerializeError(err.to_string()))?;
        self.put_bytes(Self::build_index_key(record_type), value)
            .await
    }

    async fn load_all(&self, record_type: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let ids = self.load_index(record_type).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys = ids
            .iter()
            .map(|id| Self::build_record_key(record_type, id))
            .collect();

        let output = self
            .db
            .exec(DbInstruction::MultiGetCf { keys })
            .await
            .map_err(|err| StorageError::DbError(err.to_string()))?;

        let values = match output {
            DbOutput::MultiBytes { values } => Ok(values),
            _ => Err(StorageError::DbError("unknown output type".to_string())),
        }?;

        let mut records = Vec::new();
        for value in values {
            let bytes = value.map_err(|err| StorageError::DbError(err.to_string()))?;
            if let Some(bytes) = bytes {
                records.push(StoredRecord::try_from(bytes)?);
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl<T> StorageService<T> for RocksStorage
where
    T: Record,
{
    async fn save(&self, record: &T) -> Result<(), StorageError> {
        let stored = StoredRecord::from_record(record)?;
        let _guard = self.index_lock.lock().await;

        if self.get_stored(T::RECORD_TYPE, &stored.id).await?.is_some() {
            return Err(StorageError::RecordDuplicate {
                record_type: T::RECORD_TYPE.to_string(),
                query: Tags::new().with("id", record.id()).describe(),
            });
        }

        // index first, an id without record bytes is skipped by `load_all`
        let mut ids = self.load_index(T::RECORD_TYPE).await?;
        if !ids.contains(&stored.id) {
            ids.push(stored.id.clone());
            self.store_index(T::RECORD_TYPE, &ids).await?;
        }

        self.put_stored(stored).await?;

        debug!("[rocks:save] {} {}", T::RECORD_TYPE, record.id());
        Ok(())
    }

    async fn update(&self, record: &T) -> Result<(), StorageError> {
        let stored = StoredRecord::from_record(record)?;
        let _guard = self.index_lock.lock().await;

        if self.get_stored(T::RECORD_TYPE, &stored.id).await?.is_none() {
            return Err(Self::not_found(T::RECORD_TYPE, record.id()));
        }

        self.put_stored(stored).await
    }

    async fn delete(&self, record: &T) -> Result<(), StorageError> {
        let id = record.id();
        let _guard = self.index_lock.lock().await;

        if self.get_stored(T::RECORD_TYPE, &id).await?.is_none() {
            return Err(Self::not_found(T::RECORD_TYPE, id));
        }

        let ids: Vec<String> = self
            .load_index(T::RECORD_TYPE)
            .await?
            .into_iter()
            .filter(|found| found != &id)
            .collect();

        self.remove_key(Self::build_record_key(T::RECORD_TYPE, &id))
            .await?;
        self.store_index(T::RECORD_TYPE, &ids).await?;

        debug!("[rocks:delete] {} {}", T::RECORD_TYPE, id);
        Ok(())
    }

    async fn get_by_id(&self, id: String) -> Result<T, StorageError> {
        self.get_stored(T::RECORD_TYPE, &id)
            .await?
            .ok_or_else(|| Self::not_found(T::RECORD_TYPE, id))?
            .to_record()
    }

    async fn get_all(&self) -> Result<Vec<T>, StorageError> {
        self.load_all(T::RECORD_TYPE)
            .await?
            .iter()
            .map(|stored| stored.to_record())
            .collect()
    }

    async fn find_by_query(&self, query: &Query) -> Result<Vec<T>, StorageError> {
        self.load_all(T::RECORD_TYPE)
            .await?
            .iter()
            .filter(|stored| query.matches(&stored.tags))
            .map(|stored| stored.to_record())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde::{self, Deserialize, Serialize};
    use rst_common::standard::uuid;
    use rst_common::with_tokio::tokio;

    use didx_core::storage::BaseRecord;

    use crate::common::helpers::testdb;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(crate = "self::serde")]
    struct FakeRecord {
        base: BaseRecord,
        owner: String,
        keys: Vec<String>,
    }

    impl FakeRecord {
        fn new(owner: &str, keys: Vec<&str>) -> Self {
            Self {
                base: BaseRecord::new(None, None, None),
                owner: owner.to_string(),
                keys: keys.iter().map(|key| key.to_string()).collect(),
            }
        }
    }

    impl Record for FakeRecord {
        const RECORD_TYPE: &'static str = "RocksFakeRecord";

        fn id(&self) -> String {
            self.base.id()
        }

        fn custom_tags(&self) -> &Tags {
            self.base.tags()
        }

        fn default_tags(&self) -> Tags {
            Tags::new()
                .with("owner", self.owner.clone())
                .with("keys", self.keys.clone())
        }
    }

    #[tokio::test]
    async fn test_save_get_update_delete() {
        let storage = testdb::global_storage().to_owned();
        let mut record = FakeRecord::new("owner-crud", vec!["k1"]);

        StorageService::<FakeRecord>::save(&storage, &record)
            .await
            .unwrap();

        let found: FakeRecord = storage.get_by_id(record.id()).await.unwrap();
        assert_eq!(found, record);

        record.owner = "owner-crud-updated".to_string();
        StorageService::<FakeRecord>::update(&storage, &record)
            .await
            .unwrap();

        let found: FakeRecord = storage.get_by_id(record.id()).await.unwrap();
        assert_eq!(found.owner, "owner-crud-updated");

        StorageService::<FakeRecord>::delete(&storage, &record)
            .await
            .unwrap();

        let missing: Result<FakeRecord, StorageError> = storage.get_by_id(record.id()).await;
        assert!(matches!(
            missing.unwrap_err(),
            StorageError::RecordNotFound { .. }
        ));

        let all: Vec<FakeRecord> = storage.get_all().await.unwrap();
        assert!(all.iter().all(|found| found.id() != record.id()))
    }

    #[tokio::test]
    async fn test_save_duplicate() {
        let storage = testdb::global_storage().to_owned();
        let record = FakeRecord::new("owner-duplicate", vec![]);

        StorageService::<FakeRecord>::save(&storage, &record)
            .await
            .unwrap();

        let result = StorageService::<FakeRecord>::save(&storage, &record).await;
        assert!(matches!(
            result.unwrap_err(),
            StorageError::RecordDuplicate { .. }
        ))
    }

    #[tokio::test]
    async fn test_update_missing() {
        let storage = testdb::global_storage().to_owned();
        let record = FakeRecord::new("owner-missing", vec![]);

        let result = StorageService::<FakeRecord>::update(&storage, &record).await;
        assert!(matches!(
            result.unwrap_err(),
            StorageError::RecordNotFound { .. }
        ))
    }

    #[tokio::test]
    async fn test_find_by_query() {
        let storage = testdb::global_storage().to_owned();
        let first = FakeRecord::new("owner-query", vec!["query-k1", "query-k2"]);
        let second = FakeRecord::new("owner-query", vec!["query-k3"]);

        StorageService::<FakeRecord>::save(&storage, &first)
            .await
            .unwrap();
        StorageService::<FakeRecord>::save(&storage, &second)
            .await
            .unwrap();

        let by_owner: Vec<FakeRecord> = storage
            .find_by_query(&Tags::new().with("owner", "owner-query"))
            .await
            .unwrap();
        assert_eq!(by_owner.len(), 2);

        let by_key: Vec<FakeRecord> = storage
            .find_by_query(&Tags::new().with("keys", "query-k2"))
            .await
            .unwrap();
        assert_eq!(by_key, vec![first])
    }

    #[tokio::test]
    async fn test_dangling_index_entry_is_skipped() {
        let storage = testdb::global_storage().to_owned();
        let id = uuid::Uuid::new_v4().to_string();

        {
            let _guard = storage.index_lock.lock().await;
            let mut ids = storage.load_index(FakeRecord::RECORD_TYPE).await.unwrap();
            ids.push(id.clone());
            storage
                .store_index(FakeRecord::RECORD_TYPE, &ids)
                .await
                .unwrap();
        }

        let all: Vec<FakeRecord> = storage.get_all().await.unwrap();
        assert!(all.iter().all(|found| found.id() != id));

        let record = FakeRecord {
            base: BaseRecord::new(Some(id.clone()), None, None),
            owner: "owner-dangling".to_string(),
            keys: vec![],
        };
        StorageService::<FakeRecord>::save(&storage, &record)
            .await
            .unwrap();

        let ids = storage.load_index(FakeRecord::RECORD_TYPE).await.unwrap();
        assert_eq!(ids.iter().filter(|found| **found == id).count(), 1);

        let query = Tags::new().with("owner", "owner-dangling");
        let found: Vec<FakeRecord> = storage.find_by_query(&query).await.unwrap();
        assert!(found.iter().any(|found| found.id() == id))
    }
}
