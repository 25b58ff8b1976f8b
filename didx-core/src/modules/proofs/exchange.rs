use rst_common::with_logging::log::{debug, error};

use crate::agent::message::AgentMessage;
use crate::storage::didcomm::{DidCommMessageRecord, DidCommMessageRepository, DidCommMessageRole};
use crate::storage::types::{Record, StorageError, StorageService, Tags};

use super::record::ProofExchangeRecord;
use super::repository::ProofRepository;
use super::types::ProofError;

pub trait ProofStorage:
    StorageService<ProofExchangeRecord> + StorageService<DidCommMessageRecord> + Clone + 'static
{
}

impl<T> ProofStorage for T where
    T: StorageService<ProofExchangeRecord> + StorageService<DidCommMessageRecord> + Clone + 'static
{
}

/// `ProofExchange` persists proof records together with their protocol messages, the
/// message is written first and rolled back when the record write fails
#[derive(Clone)]
pub struct ProofExchange<TStorage: ProofStorage> {
    proofs: ProofRepository<TStorage>,
    messages: DidCommMessageRepository<TStorage>,
}

impl<TStorage: ProofStorage> ProofExchange<TStorage> {
    pub fn new(storage: TStorage) -> Self {
        Self {
            proofs: ProofRepository::new(storage.clone()),
            messages: DidCommMessageRepository::new(storage),
        }
    }

    pub fn proofs(&self) -> &ProofRepository<TStorage> {
        &self.proofs
    }

    pub fn messages(&self) -> &DidCommMessageRepository<TStorage> {
        &self.messages
    }

    pub async fn get_by_id(&self, id: String) -> Result<ProofExchangeRecord, ProofError> {
        self.proofs.get_by_id(id).await.map_err(ProofError::from)
    }

    pub async fn find_for_inbound(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> Result<Option<ProofExchangeRecord>, ProofError> {
        let record = self.proofs.find_by_thread(thread_id, connection_id).await?;

        if let Some(found) = &record {
            if found.state().is_terminal() {
                error!(
                    "[proofs:inbound] message received on closed thread: {} | state: {}",
                    thread_id,
                    found.state()
                );

                return Err(ProofError::ThreadClosed {
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
    ) -> Result<ProofExchangeRecord, ProofError> {
        self.find_for_inbound(thread_id, connection_id)
            .await?
            .ok_or_else(|| {
                ProofError::StorageError(StorageError::RecordNotFound {
                    record_type: ProofExchangeRecord::RECORD_TYPE.to_string(),
                    query: Tags::new()
                        .with("threadId", thread_id)
                        .with_opt("connectionId", connection_id)
                        .describe(),
                })
            })
    }

    pub async fn persist<TMessage: AgentMessage>(
        &self,
        record: &ProofExchangeRecord,
        role: DidCommMessageRole,
        message: &TMessage,
        is_new: bool,
    ) -> Result<(), ProofError> {
        let saved = self
            .messages
            .save_or_update_agent_message(role, message, &record.id())
            .await?;

        let stored = if is_new {
            self.proofs.save(record).await
        } else {
            self.proofs.update(record).await
        };

        if let Err(err) = stored {
            error!("[proofs:persist] record write failed: {} | err: {}", record.id(), err);
            if let Err(rollback_err) = self.messages.rollback(&saved).await {
                error!("[proofs:persist] message rollback failed: {}", rollback_err);
            }

            return Err(ProofError::from(err));
        }

        debug!(
            "[proofs:persist] record: {} | state: {} | message: {}",
            record.id(),
            record.state(),
            TMessage::MESSAGE_TYPE
        );
        Ok(())
    }

    pub async fn update_record(&self, record: &ProofExchangeRecord) -> Result<(), ProofError> {
        self.proofs.update(record).await.map_err(ProofError::from)
    }
}
