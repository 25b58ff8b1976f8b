use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_logging::log::debug;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::storage::record::BaseRecord;
use crate::storage::types::{Record, StorageError, TagValue, Tags};

use super::types::{MediationError, MediationRole, MediationState};

pub const DEFAULT_MEDIATOR_TAG: &str = "default";

/// `MediationRecord` tracks the mediation agreement of one connection, on the
/// recipient side it holds the keys the mediator routes for
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct MediationRecord {
    #[serde(flatten)]
    pub(crate) base: BaseRecord,

    pub(crate) state: MediationState,
    pub(crate) role: MediationRole,

    #[serde(rename = "connectionId")]
    pub(crate) connection_id: String,

    #[serde(rename = "threadId")]
    pub(crate) thread_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,

    #[serde(rename = "recipientKeys")]
    #[serde(default)]
    pub(crate) recipient_keys: Vec<String>,

    #[serde(rename = "routingKeys")]
    #[serde(default)]
    pub(crate) routing_keys: Vec<String>,
}

impl MediationRecord {
    pub fn new(
        state: MediationState,
        role: MediationRole,
        connection_id: &str,
        thread_id: &str,
    ) -> Self {
        Self {
            base: BaseRecord::new(None, None, None),
            state,
            role,
            connection_id: connection_id.to_string(),
            thread_id: thread_id.to_string(),
            endpoint: None,
            recipient_keys: Vec::new(),
            routing_keys: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn state(&self) -> MediationState {
        self.state
    }

    pub fn role(&self) -> MediationRole {
        self.role
    }

    pub fn connection_id(&self) -> String {
        self.connection_id.to_owned()
    }

    pub fn thread_id(&self) -> String {
        self.thread_id.to_owned()
    }

    pub fn endpoint(&self) -> Option<String> {
        self.endpoint.to_owned()
    }

    pub fn recipient_keys(&self) -> &[String] {
        &self.recipient_keys
    }

    pub fn routing_keys(&self) -> &[String] {
        &self.routing_keys
    }

    pub fn is_default(&self) -> bool {
        matches!(
            self.base.tags().get(DEFAULT_MEDIATOR_TAG),
            Some(TagValue::Bool(true))
        )
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.base.set_tag(DEFAULT_MEDIATOR_TAG, is_default);
    }

    /// Keys are an ordered set, adding a key already present is a no-op
    pub fn add_recipient_key(&mut self, key: &str) {
        if !self.recipient_keys.iter().any(|found| found == key) {
            self.recipient_keys.push(key.to_string());
        }
    }

    /// `remove_recipient_key` drops the first occurrence of the key and reports whether
    /// anything was removed
    pub fn remove_recipient_key(&mut self, key: &str) -> bool {
        match self.recipient_keys.iter().position(|found| found == key) {
            Some(index) => {
                self.recipient_keys.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn add_routing_key(&mut self, key: &str) {
        if !self.routing_keys.iter().any(|found| found == key) {
            self.routing_keys.push(key.to_string());
        }
    }

    pub fn remove_routing_key(&mut self, key: &str) -> bool {
        match self.routing_keys.iter().position(|found| found == key) {
            Some(index) => {
                self.routing_keys.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == MediationState::Granted
    }

    pub fn assert_ready(&self) -> Result<(), MediationError> {
        if self.is_ready() {
            return Ok(());
        }

        Err(MediationError::NotReady {
            record_id: self.base.id(),
            expected: MediationState::Granted.to_string(),
            actual: self.state.to_string(),
        })
    }

    pub fn assert_state(&self, expected: &[MediationState]) -> Result<(), MediationError> {
        if expected.contains(&self.state) {
            return Ok(());
        }

        let expected_states: Vec<&str> = expected.iter().map(|state| state.as_str()).collect();
        Err(MediationError::InvalidState {
            record_id: self.base.id(),
            expected: expected_states.join(", "),
            actual: self.state.to_string(),
        })
    }

    pub fn assert_role(&self, expected: MediationRole) -> Result<(), MediationError> {
        if self.role == expected {
            return Ok(());
        }

        Err(MediationError::InvalidRole {
            record_id: self.base.id(),
            expected: expected.to_string(),
            actual: self.role.to_string(),
        })
    }

    /// `set_state` follows the mediation transition table: `init` to `requested`, then
    /// `requested` to either `granted` or `denied`
    pub fn set_state(&mut self, next: MediationState) -> Result<(), MediationError> {
        if !self.state.can_transition_to(next) {
            let expected: Vec<&str> = next
                .previous_states()
                .iter()
                .map(|state| state.as_str())
                .collect();

            return Err(MediationError::InvalidState {
                record_id: self.base.id(),
                expected: if expected.is_empty() {
                    "none".to_string()
                } else {
                    expected.join(", ")
                },
                actual: self.state.to_string(),
            });
        }

        debug!(
            "[mediation:state] record: {} | {} -> {}",
            self.base.id(),
            self.state,
            next
        );

        self.state = next;
        self.base.touch();
        Ok(())
    }
}

impl Record for MediationRecord {
    const RECORD_TYPE: &'static str = "MediationRecord";

    fn id(&self) -> String {
        self.base.id()
    }

    fn custom_tags(&self) -> &Tags {
        self.base.tags()
    }

    fn default_tags(&self) -> Tags {
        Tags::new()
            .with("state", self.state.as_str())
            .with("role", self.role.as_str())
            .with("connectionId", self.connection_id.clone())
            .with("threadId", self.thread_id.clone())
            .with("recipientKeys", self.recipient_keys.clone())
    }
}

impl ToJSON for MediationRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        rst_common::standard::serde_json::to_string(self)
            .map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for MediationRecord {
    type Error = StorageError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        let json = self
            .to_json()
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;
        Ok(json.as_bytes().to_vec())
    }
}

impl TryFrom<Vec<u8>> for MediationRecord {
    type Error = StorageError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        rst_common::standard::serde_json::from_slice(&value)
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}
