use crate::storage::repository::Repository;
use crate::storage::types::{Query, StorageError, StorageService, Tags};

use super::record::CredentialExchangeRecord;

#[derive(Clone)]
pub struct CredentialRepository<TStorage>
where
    TStorage: StorageService<CredentialExchangeRecord> + Clone,
{
    repo: Repository<CredentialExchangeRecord, TStorage>,
}

impl<TStorage> CredentialRepository<TStorage>
where
    TStorage: StorageService<CredentialExchangeRecord> + Clone,
{
    pub fn new(storage: TStorage) -> Self {
        Self {
            repo: Repository::new(storage),
        }
    }

    pub async fn save(&self, record: &CredentialExchangeRecord) -> Result<(), StorageError> {
        self.repo.save(record).await
    }

    pub async fn update(&self, record: &CredentialExchangeRecord) -> Result<(), StorageError> {
        self.repo.update(record).await
    }

    pub async fn delete(&self, record: &CredentialExchangeRecord) -> Result<(), StorageError> {
        self.repo.delete(record).await
    }

    pub async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, StorageError> {
        self.repo.get_by_id(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<CredentialExchangeRecord>, StorageError> {
        self.repo.get_all().await
    }

    pub async fn find_by_query(
        &self,
        query: &Query,
    ) -> Result<Vec<CredentialExchangeRecord>, StorageError> {
        self.repo.find_by_query(query).await
    }

    fn thread_query(thread_id: &str, connection_id: Option<&str>) -> Query {
        Tags::new()
            .with("threadId", thread_id)
            .with_opt("connectionId", connection_id)
    }

    pub async fn find_by_thread(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<Option<CredentialExchangeRecord>, StorageError> {
        self.repo
            .find_single_by_query(&Self::thread_query(thread_id, connection_id))
            .await
    }

    pub async fn get_by_thread(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<CredentialExchangeRecord, StorageError> {
        self.repo
            .get_single_by_query(&Self::thread_query(thread_id, connection_id))
            .await
    }
}
