use rst_common::with_logging::log::{debug, error};

use crate::agent::message::AgentMessage;
use crate::storage::didcomm::{DidCommMessageRecord, DidCommMessageRepository, DidCommMessageRole};
use crate::storage::types::{Record, StorageError, StorageService, Tags};

use super::record::CredentialExchangeRecord;
use super::repository::CredentialRepository;
use super::types::CredentialError;

/// `CredentialStorage` is any store able to keep both the exchange records and their
/// protocol messages
pub trait CredentialStorage:
    StorageService<CredentialExchangeRecord>
    + StorageService<DidCommMessageRecord>
    + Clone
    + 'static
{
}

impl<T> CredentialStorage for T where
    T: StorageService<CredentialExchangeRecord>
        + StorageService<DidCommMessageRecord>
        + Clone
        + 'static
{
}

/// `CredentialExchange` holds the persistence steps shared by every protocol version
///
/// A state mutation always writes the message first and the record second, a failed
/// record write rolls the message back so neither is left advanced on its own
#[derive(Clone)]
pub struct CredentialExchange<TStorage: CredentialStorage> {
    credentials: CredentialRepository<TStorage>,
    messages: DidCommMessageRepository<TStorage>,
}

impl<TStorage: CredentialStorage> CredentialExchange<TStorage> {
    pub fn new(storage: TStorage) -> Self {
        Self {
            credentials: CredentialRepository::new(storage.clone()),
            messages: DidCommMessageRepository::new(storage),
        }
    }

    pub fn credentials(&self) -> &CredentialRepository<TStorage> {
        &self.credentials
    }

    pub fn messages(&self) -> &DidCommMessageRepository<TStorage> {
        &self.messages
    }

    pub async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, CredentialError> {
        self.credentials.get_by_id(id).await.map_err(CredentialError::from)
    }

    /// `find_for_inbound` looks up the record of an inbound thread, a record whose
    /// conversation already ended is reported instead of being handed back
    pub async fn find_for_inbound(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<Option<CredentialExchangeRecord>, CredentialError> {
        let record = self
            .credentials
            .find_by_thread(thread_id, connection_id)
            .await?;

        if let Some(found) = &record {
            if found.state().is_terminal() {
                error!(
                    "[credentials:inbound] message received on closed thread: {} | state: {}",
                    thread_id,
                    found.state()
                );

                return Err(CredentialError::ThreadClosed {
                    thread_id: thread_id.to_string(),
                    state: found.state().to_string(),
                });
            }

            found.assert_connection(connection_id)?;
        }

        Ok(record)
    }

    pub async fn get_for_inbound(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        self.find_for_inbound(thread_id, connection_id)
            .await?
            .ok_or_else(|| {
                CredentialError::StorageError(StorageError::RecordNotFound {
                    record_type: CredentialExchangeRecord::RECORD_TYPE.to_string(),
                    query: Tags::new()
                        .with("threadId", thread_id)
                        .with_opt("connectionId", connection_id)
                        .describe(),
                })
            })
    }

    pub async fn persist_new<TMessage: AgentMessage>(
        &self,
        record: &CredentialExchangeRecord,
        role: DidCommMessageRole,
        message: &TMessage,
    ) -> Result<(), CredentialError> {
        self.persist(record, role, message, true).await
    }

    pub async fn persist_update<TMessage: AgentMessage>(
        &self,
        record: &CredentialExchangeRecord,
        role: DidCommMessageRole,
        message: &TMessage,
    ) -> Result<(), CredentialError> {
        self.persist(record, role, message, false).await
    }

    async fn persist<TMessage: AgentMessage>(
        &self,
        record: &CredentialExchangeRecord,
        role: DidCommMessageRole,
        message: &TMessage,
        is_new: bool,
    ) -> Result<(), CredentialError> {
        let saved = self
            .messages
            .save_or_update_agent_message(role, message, &record.id())
            .await?;

        let stored = if is_new {
            self.credentials.save(record).await
        } else {
            self.credentials.update(record).await
        };

        if let Err(err) = stored {
            error!(
                "[credentials:persist] record write failed: {} | err: {}",
                record.id(),
                err
            );

            if let Err(rollback_err) = self.messages.rollback(&saved).await {
                error!(
                    "[credentials:persist] message rollback failed: {}",
                    rollback_err
                );
            }

            return Err(CredentialError::from(err));
        }

        debug!(
            "[credentials:persist] record: {} | state: {} | message: {}",
            record.id(),
            record.state(),
            TMessage::MESSAGE_TYPE
        );

        Ok(())
    }

    pub async fn update_record(
        &self,
        record: &CredentialExchangeRecord,
    ) -> Result<(), CredentialError> {
        self.credentials.update(record).await.map_err(CredentialError::from)
    }
}
