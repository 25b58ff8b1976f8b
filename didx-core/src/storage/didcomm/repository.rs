use rst_common::with_logging::log::{debug, warn};

use crate::agent::message::AgentMessage;
use crate::storage::repository::Repository;
use crate::storage::types::{Query, Record, StorageError, StorageService, Tags};

use super::record::{DidCommMessageRecord, DidCommMessageRole};

/// `SavedAgentMessage` reports what an upsert did, so a caller whose paired record write
/// fails can put the message store back the way it was
#[derive(Debug, Clone, PartialEq)]
pub enum SavedAgentMessage {
    Created(DidCommMessageRecord),
    Updated {
        previous: DidCommMessageRecord,
        current: DidCommMessageRecord,
    },
}

impl SavedAgentMessage {
    pub fn record(&self) -> &DidCommMessageRecord {
        match self {
            SavedAgentMessage::Created(record) => record,
            SavedAgentMessage::Updated { current, .. } => current,
        }
    }
}

/// `DidCommMessageRepository` keeps one stored message per
/// `(associated_record_id, message_type)` pair
#[derive(Clone)]
pub struct DidCommMessageRepository<TStorage>
where
    TStorage: StorageService<DidCommMessageRecord> + Clone,
{
    repo: Repository<DidCommMessageRecord, TStorage>,
}

impl<TStorage> DidCommMessageRepository<TStorage>
where
    TStorage: StorageService<DidCommMessageRecord> + Clone,
{
    pub fn new(storage: TStorage) -> Self {
        Self {
            repo: Repository::new(storage),
        }
    }

    fn build_query<TMessage: AgentMessage>(associated_record_id: &str) -> Query {
        Tags::new()
            .with("associatedRecordId", associated_record_id)
            .with("messageType", TMessage::MESSAGE_TYPE)
    }

    fn unserialize<TMessage: AgentMessage>(
        record: &DidCommMessageRecord,
    ) -> Result<TMessage, StorageError> {
        record
            .get_message_instance::<TMessage>()
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }

    pub async fn get_agent_message<TMessage: AgentMessage>(
        &self,
        associated_record_id: &str,
    ) -> Result<TMessage, StorageError> {
        let query = Self::build_query::<TMessage>(associated_record_id);
        let record = self.repo.get_single_by_query(&query).await?;
        Self::unserialize(&record)
    }

    pub async fn find_agent_message<TMessage: AgentMessage>(
        &self,
        associated_record_id: &str,
    ) -> Result<Option<TMessage>, StorageError> {
        let query = Self::build_query::<TMessage>(associated_record_id);
        let record = self.repo.find_single_by_query(&query).await?;

        match record {
            Some(found) => Self::unserialize(&found).map(Some),
            None => Ok(None),
        }
    }

    pub async fn save_agent_message<TMessage: AgentMessage>(
        &self,
        role: DidCommMessageRole,
        agent_message: &TMessage,
        associated_record_id: &str,
    ) -> Result<DidCommMessageRecord, StorageError> {
        let message = agent_message
            .to_value()
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;

        let record = DidCommMessageRecord::new(
            None,
            role,
            message,
            Some(associated_record_id.to_string()),
        );

        self.repo.save(&record).await?;
        debug!(
            "[didcomm:save] message type: {} | associated record: {}",
            TMessage::MESSAGE_TYPE,
            associated_record_id
        );

        Ok(record)
    }

    pub async fn save_or_update_agent_message<TMessage: AgentMessage>(
        &self,
        role: DidCommMessageRole,
        agent_message: &TMessage,
        associated_record_id: &str,
    ) -> Result<SavedAgentMessage, StorageError> {
        let query = Self::build_query::<TMessage>(associated_record_id);
        let existing = self.repo.find_single_by_query(&query).await?;

        match existing {
            Some(previous) => {
                let message = agent_message
                    .to_value()
                    .map_err(|err| StorageError::SerializeError(err.to_string()))?;

                let mut current = previous.clone();
                current.replace_message(role, message);
                self.repo.update(&current).await?;

                debug!(
                    "[didcomm:upsert] updated record: {} | message type: {}",
                    current.id(),
                    TMessage::MESSAGE_TYPE
                );

                Ok(SavedAgentMessage::Updated { previous, current })
            }
            None => self
                .save_agent_message(role, agent_message, associated_record_id)
                .await
                .map(SavedAgentMessage::Created),
        }
    }

    /// `rollback` undoes an upsert: a created record is deleted, an updated record gets
    /// its previous content back
    pub async fn rollback(&self, saved: &SavedAgentMessage) -> Result<(), StorageError> {
        warn!(
            "[didcomm:rollback] restoring message record: {}",
            saved.record().id()
        );

        match saved {
            SavedAgentMessage::Created(record) => self.repo.delete(record).await,
            SavedAgentMessage::Updated { previous, .. } => self.repo.update(previous).await,
        }
    }

    pub async fn find_by_associated_record_id(
        &self,
        associated_record_id: &str,
    ) -> Result<Vec<DidCommMessageRecord>, StorageError> {
        let query = Tags::new().with("associatedRecordId", associated_record_id);
        self.repo.find_by_query(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    use rst_common::standard::async_trait::async_trait;
    use rst_common::standard::serde_json::{self, json, Value};
    use rst_common::with_tokio::tokio;

    use crate::modules::connections::messages::ConnectionInvitationMessage;
    use crate::storage::memory::InMemoryStorage;

    mock!(
        FakeStorage{}

        impl Clone for FakeStorage {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl StorageService<DidCommMessageRecord> for FakeStorage {
            async fn save(&self, record: &DidCommMessageRecord) -> Result<(), StorageError>;
            async fn update(&self, record: &DidCommMessageRecord) -> Result<(), StorageError>;
            async fn delete(&self, record: &DidCommMessageRecord) -> Result<(), StorageError>;
            async fn get_by_id(&self, id: String) -> Result<DidCommMessageRecord, StorageError>;
            async fn get_all(&self) -> Result<Vec<DidCommMessageRecord>, StorageError>;
            async fn find_by_query(
                &self,
                query: &Query,
            ) -> Result<Vec<DidCommMessageRecord>, StorageError>;
        }
    );

    const ASSOCIATED_RECORD_ID: &str = "04a2c382-999e-4de9-a1d2-9dec0b2fa5e4";

    fn invitation_json() -> Value {
        json!({
            "@type": "https://didcomm.org/connections/1.0/invitation",
            "@id": "04a2c382-999e-4de9-a1d2-9dec0b2fa5e4",
            "recipientKeys": ["recipientKeyOne", "recipientKeyTwo"],
            "serviceEndpoint": "https://example.com",
            "label": "test"
        })
    }

    fn invitation() -> ConnectionInvitationMessage {
        serde_json::from_value(invitation_json()).unwrap()
    }

    fn get_record(id: &str) -> DidCommMessageRecord {
        DidCommMessageRecord::new(
            Some(id.to_string()),
            DidCommMessageRole::Receiver,
            invitation_json(),
            Some("16ca6665-29f6-4333-a80e-d34db6bfe0b0".to_string()),
        )
    }

    fn expected_query() -> Query {
        Tags::new()
            .with("associatedRecordId", ASSOCIATED_RECORD_ID)
            .with("messageType", "https://didcomm.org/connections/1.0/invitation")
    }

    #[tokio::test]
    async fn test_get_agent_message() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_find_by_query()
            .with(eq(expected_query()))
            .times(1)
            .returning(|_| Ok(vec![get_record("test-id")]));

        let repo = DidCommMessageRepository::new(storage);
        let message = repo
            .get_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await;

        assert!(message.is_ok());
        assert_eq!(message.unwrap(), invitation())
    }

    #[tokio::test]
    async fn test_get_agent_message_not_found() {
        let mut storage = MockFakeStorage::new();
        storage.expect_find_by_query().returning(|_| Ok(vec![]));

        let repo = DidCommMessageRepository::new(storage);
        let message = repo
            .get_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await;

        assert!(matches!(
            message.unwrap_err(),
            StorageError::RecordNotFound { .. }
        ))
    }

    #[tokio::test]
    async fn test_get_agent_message_duplicate() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_find_by_query()
            .returning(|_| Ok(vec![get_record("id-1"), get_record("id-2")]));

        let repo = DidCommMessageRepository::new(storage);
        let message = repo
            .get_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await;

        assert!(matches!(
            message.unwrap_err(),
            StorageError::RecordDuplicate { .. }
        ))
    }

    #[tokio::test]
    async fn test_find_agent_message() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_find_by_query()
            .with(eq(expected_query()))
            .times(1)
            .returning(|_| Ok(vec![get_record("test-id")]));

        let repo = DidCommMessageRepository::new(storage);
        let message = repo
            .find_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await;

        assert!(message.is_ok());
        assert_eq!(message.unwrap(), Some(invitation()))
    }

    #[tokio::test]
    async fn test_find_agent_message_missing() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_find_by_query()
            .with(eq(expected_query()))
            .times(1)
            .returning(|_| Ok(vec![]));

        let repo = DidCommMessageRepository::new(storage);
        let message = repo
            .find_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await;

        assert!(message.is_ok());
        assert!(message.unwrap().is_none())
    }

    #[tokio::test]
    async fn test_save_agent_message() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_save()
            .withf(|record: &DidCommMessageRecord| {
                record.role() == DidCommMessageRole::Receiver
                    && record.message() == &invitation_json()
                    && record.associated_record_id() == Some(ASSOCIATED_RECORD_ID.to_string())
            })
            .times(1)
            .returning(|_| Ok(()));

        let repo = DidCommMessageRepository::new(storage);
        let saved = repo
            .save_agent_message(
                DidCommMessageRole::Receiver,
                &invitation(),
                ASSOCIATED_RECORD_ID,
            )
            .await;

        assert!(saved.is_ok())
    }

    #[tokio::test]
    async fn test_save_or_update_creates() {
        let mut storage = MockFakeStorage::new();
        storage.expect_find_by_query().returning(|_| Ok(vec![]));
        storage
            .expect_save()
            .withf(|record: &DidCommMessageRecord| {
                record.role() == DidCommMessageRole::Receiver
                    && record.message() == &invitation_json()
                    && record.associated_record_id() == Some(ASSOCIATED_RECORD_ID.to_string())
            })
            .times(1)
            .returning(|_| Ok(()));
        storage.expect_update().never();

        let repo = DidCommMessageRepository::new(storage);
        let saved = repo
            .save_or_update_agent_message(
                DidCommMessageRole::Receiver,
                &invitation(),
                ASSOCIATED_RECORD_ID,
            )
            .await;

        assert!(matches!(saved.unwrap(), SavedAgentMessage::Created(_)))
    }

    #[tokio::test]
    async fn test_save_or_update_updates_in_place() {
        let mut storage = MockFakeStorage::new();
        storage
            .expect_find_by_query()
            .returning(|_| Ok(vec![get_record("test-id")]));
        storage
            .expect_update()
            .withf(|record: &DidCommMessageRecord| {
                record.id() == "test-id" && record.message() == &invitation_json()
            })
            .times(1)
            .returning(|_| Ok(()));
        storage.expect_save().never();

        let repo = DidCommMessageRepository::new(storage);
        let saved = repo
            .save_or_update_agent_message(
                DidCommMessageRole::Receiver,
                &invitation(),
                ASSOCIATED_RECORD_ID,
            )
            .await;

        match saved.unwrap() {
            SavedAgentMessage::Updated { previous, current } => {
                assert_eq!(previous.id(), "test-id");
                assert_eq!(current.id(), "test-id");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_or_update_is_idempotent() {
        let repo = DidCommMessageRepository::new(InMemoryStorage::new());

        let mut last_label = String::new();
        for round in 0..3 {
            let mut message = invitation();
            message.label = format!("round-{round}");
            last_label = message.label.clone();

            let saved = repo
                .save_or_update_agent_message(
                    DidCommMessageRole::Sender,
                    &message,
                    ASSOCIATED_RECORD_ID,
                )
                .await;
            assert!(saved.is_ok());
        }

        let records = repo
            .find_by_associated_record_id(ASSOCIATED_RECORD_ID)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        let stored = repo
            .get_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await
            .unwrap();
        assert_eq!(stored.label, last_label)
    }

    #[tokio::test]
    async fn test_rollback_restores_previous_state() {
        let repo = DidCommMessageRepository::new(InMemoryStorage::new());

        let created = repo
            .save_or_update_agent_message(
                DidCommMessageRole::Sender,
                &invitation(),
                ASSOCIATED_RECORD_ID,
            )
            .await
            .unwrap();

        let mut changed = invitation();
        changed.label = "changed".to_string();
        let updated = repo
            .save_or_update_agent_message(
                DidCommMessageRole::Sender,
                &changed,
                ASSOCIATED_RECORD_ID,
            )
            .await
            .unwrap();

        assert!(repo.rollback(&updated).await.is_ok());
        let stored = repo
            .get_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await
            .unwrap();
        assert_eq!(stored.label, "test");

        assert!(repo.rollback(&created).await.is_ok());
        let missing = repo
            .find_agent_message::<ConnectionInvitationMessage>(ASSOCIATED_RECORD_ID)
            .await
            .unwrap();
        assert!(missing.is_none())
    }
}
