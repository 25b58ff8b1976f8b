use crate::storage::repository::Repository;
use crate::storage::types::{Query, StorageError, StorageService, Tags};

use super::record::ProofExchangeRecord;

#[derive(Clone)]
pub struct ProofRepository<TStorage>
where
    TStorage: StorageService<ProofExchangeRecord> + Clone,
{
    repo: Repository<ProofExchangeRecord, TStorage>,
}

impl<TStorage> ProofRepository<TStorage>
where
    TStorage: StorageService<ProofExchangeRecord> + Clone,
{
    pub fn new(storage: TStorage) -> Self {
        Self {
            repo: Repository::new(storage),
        }
    }

    pub async fn save(&self, record: &ProofExchangeRecord) -> Result<(), StorageError> {
        self.repo.save(record).await
    }

    pub async fn update(&self, record: &ProofExchangeRecord) -> Result<(), StorageError> {
        self.repo.update(record).await
    }

    pub async fn get_by_id(&self, id: String) -> Result<ProofExchangeRecord, StorageError> {
        self.repo.get_by_id(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<ProofExchangeRecord>, StorageError> {
        self.repo.get_all().await
    }

    pub async fn find_by_query(
        &self,
        query: &Query,
    ) -> Result<Vec<ProofExchangeRecord>, StorageError> {
        self.repo.find_by_query(query).await
    }

    pub async fn find_by_thread(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<Option<ProofExchangeRecord>, StorageError> {
        let query = Tags::new()
            .with("threadId", thread_id)
            .with_opt("connectionId", connection_id);

        self.repo.find_single_by_query(&query).await
    }
}
