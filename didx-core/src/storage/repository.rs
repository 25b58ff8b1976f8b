use std::marker::PhantomData;

use super::types::{Query, Record, StorageError, StorageService};

/// `Repository` is a typed facade over a [`StorageService`]
///
/// It adds the single-result lookups, where more than one match for a query that must be
/// unique is reported as [`StorageError::RecordDuplicate`]
#[derive(Clone)]
pub struct Repository<T, TStorage>
where
    T: Record,
    TStorage: StorageService<T> + Clone,
{
    storage: TStorage,
    _phantom: PhantomData<T>,
}

impl<T, TStorage> Repository<T, TStorage>
where
    T: Record,
    TStorage: StorageService<T> + Clone,
{
    pub fn new(storage: TStorage) -> Self {
        Self {
            storage,
            _phantom: PhantomData,
        }
    }

    pub fn storage(&self) -> &TStorage {
        &self.storage
    }

    pub async fn save(&self, record: &T) -> Result<(), StorageError> {
        self.storage.save(record).await
    }

    pub async fn update(&self, record: &T) -> Result<(), StorageError> {
        self.storage.update(record).await
    }

    pub async fn delete(&self, record: &T) -> Result<(), StorageError> {
        self.storage.delete(record).await
    }

    pub async fn get_by_id(&self, id: String) -> Result<T, StorageError> {
        self.storage.get_by_id(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<T>, StorageError> {
        self.storage.get_all().await
    }

    pub async fn find_by_query(&self, query: &Query) -> Result<Vec<T>, StorageError> {
        self.storage.find_by_query(query).await
    }

    pub async fn find_single_by_query(&self, query: &Query) -> Result<Option<T>, StorageError> {
        let mut records = self.storage.find_by_query(query).await?;
        if records.len() > 1 {
            return Err(StorageError::RecordDuplicate {
                record_type: T::RECORD_TYPE.to_string(),
                query: query.describe(),
            });
        }

        Ok(records.pop())
    }

    pub async fn get_single_by_query(&self, query: &Query) -> Result<T, StorageError> {
        self.find_single_by_query(query)
            .await?
            .ok_or_else(|| StorageError::RecordNotFound {
                record_type: T::RECORD_TYPE.to_string(),
                query: query.describe(),
            })
    }
}
