use crate::storage::repository::Repository;
use crate::storage::types::{StorageService, Tags};

use super::record::{MediationRecord, DEFAULT_MEDIATOR_TAG};
use super::types::MediationError;

#[derive(Clone)]
pub struct MediationRepository<TStorage>
where
    TStorage: StorageService<MediationRecord> + Clone,
{
    repo: Repository<MediationRecord, TStorage>,
}

impl<TStorage> MediationRepository<TStorage>
where
    TStorage: StorageService<MediationRecord> + Clone,
{
    pub fn new(storage: TStorage) -> Self {
        Self {
            repo: Repository::new(storage),
        }
    }

    pub async fn save(&self, record: &MediationRecord) -> Result<(), MediationError> {
        self.repo.save(record).await.map_err(MediationError::from)
    }

    pub async fn update(&self, record: &MediationRecord) -> Result<(), MediationError> {
        self.repo.update(record).await.map_err(MediationError::from)
    }

    pub async fn get_by_id(&self, id: String) -> Result<MediationRecord, MediationError> {
        self.repo.get_by_id(id).await.map_err(MediationError::from)
    }

    pub async fn get_all(&self) -> Result<Vec<MediationRecord>, MediationError> {
        self.repo.get_all().await.map_err(MediationError::from)
    }

    pub async fn get_by_connection_id(
        &self,
        connection_id: &str,
    ) -> Result<MediationRecord, MediationError> {
        let query = Tags::new().with("connectionId", connection_id);
        self.repo
            .get_single_by_query(&query)
            .await
            .map_err(MediationError::from)
    }

    /// `get_single_by_recipient_key` finds the mediation that routes for the key, the
    /// recipient keys are a list tag so a single key query matches by membership
    pub async fn get_single_by_recipient_key(
        &self,
        recipient_key: &str,
    ) -> Result<MediationRecord, MediationError> {
        let query = Tags::new().with("recipientKeys", recipient_key);
        self.repo
            .get_single_by_query(&query)
            .await
            .map_err(MediationError::from)
    }

    pub async fn find_default(&self) -> Result<Option<MediationRecord>, MediationError> {
        let query = Tags::new().with(DEFAULT_MEDIATOR_TAG, true);
        self.repo
            .find_single_by_query(&query)
            .await
            .map_err(MediationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::with_tokio::tokio;

    use crate::modules::routing::types::{MediationRole, MediationState};
    use crate::storage::memory::InMemoryStorage;
    use crate::storage::types::StorageError;

    async fn generate_repository() -> MediationRepository<InMemoryStorage> {
        let repo = MediationRepository::new(InMemoryStorage::new());

        let mut first = MediationRecord::new(
            MediationState::Granted,
            MediationRole::Recipient,
            "conn-1",
            "thread-1",
        )
        .with_endpoint("https://mediator.example.com");
        first.add_recipient_key("k1");
        first.add_recipient_key("k2");
        first.set_default(true);

        let mut second = MediationRecord::new(
            MediationState::Requested,
            MediationRole::Recipient,
            "conn-2",
            "thread-2",
        );
        second.add_recipient_key("k3");

        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_lookup_by_recipient_key() {
        let repo = generate_repository().await;

        let found = repo.get_single_by_recipient_key("k2").await.unwrap();
        assert_eq!(found.connection_id(), "conn-1");

        let missing = repo.get_single_by_recipient_key("absent").await;
        assert!(matches!(
            missing.unwrap_err(),
            MediationError::StorageError(StorageError::RecordNotFound { .. })
        ))
    }

    #[tokio::test]
    async fn test_lookup_by_connection_and_default() {
        let repo = generate_repository().await;

        let found = repo.get_by_connection_id("conn-2").await.unwrap();
        assert_eq!(found.state(), MediationState::Requested);

        let default = repo.find_default().await.unwrap();
        assert_eq!(default.map(|record| record.connection_id()), Some("conn-1".to_string()))
    }
}
