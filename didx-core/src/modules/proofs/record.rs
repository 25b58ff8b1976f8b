use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::storage::record::BaseRecord;
use crate::storage::types::{Record, StorageError, Tags};

use super::types::{AutoAcceptProof, ProofError, ProofRole, ProofState};

/// `ProofExchangeRecord` is the persisted state machine of one present-proof
/// conversation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ProofExchangeRecord {
    #[serde(flatten)]
    pub(crate) base: BaseRecord,

    #[serde(rename = "connectionId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) connection_id: Option<String>,

    #[serde(rename = "threadId")]
    pub(crate) thread_id: String,

    pub(crate) state: ProofState,
    pub(crate) role: ProofRole,

    #[serde(rename = "autoAcceptProof")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) auto_accept_proof: Option<AutoAcceptProof>,

    #[serde(rename = "isVerified")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) is_verified: Option<bool>,

    #[serde(rename = "errorMessage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

impl ProofExchangeRecord {
    pub fn new(
        connection_id: Option<String>,
        thread_id: String,
        state: ProofState,
        role: ProofRole,
    ) -> Result<Self, ProofError> {
        if !state.is_initial() {
            return Err(ProofError::InvalidState {
                record_id: "-".to_string(),
                expected: "an initial state".to_string(),
                actual: state.to_string(),
            });
        }

        Ok(Self {
            base: BaseRecord::new(None, None, None),
            connection_id,
            thread_id,
            state,
            role,
            auto_accept_proof: None,
            is_verified: None,
            error_message: None,
        })
    }

    pub fn with_auto_accept(mut self, auto_accept: Option<AutoAcceptProof>) -> Self {
        self.auto_accept_proof = auto_accept;
        self
    }

    pub fn connection_id(&self) -> Option<String> {
        self.connection_id.to_owned()
    }

    pub fn thread_id(&self) -> String {
        self.thread_id.to_owned()
    }

    pub fn state(&self) -> ProofState {
        self.state
    }

    pub fn role(&self) -> ProofRole {
        self.role
    }

    pub fn auto_accept_proof(&self) -> Option<AutoAcceptProof> {
        self.auto_accept_proof
    }

    pub fn is_verified(&self) -> Option<bool> {
        self.is_verified
    }

    pub fn error_message(&self) -> Option<String> {
        self.error_message.to_owned()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    pub fn assert_state(&self, expected: &[ProofState]) -> Result<(), ProofError> {
        if expected.contains(&self.state) {
            return Ok(());
        }

        let expected_states: Vec<&str> = expected.iter().map(|state| state.as_str()).collect();
        Err(ProofError::InvalidState {
            record_id: self.base.id(),
            expected: expected_states.join(", "),
            actual: self.state.to_string(),
        })
    }

    pub fn assert_role(&self, expected: ProofRole) -> Result<(), ProofError> {
        if self.role == expected {
            return Ok(());
        }

        Err(ProofError::InvalidRole {
            record_id: self.base.id(),
            expected: expected.to_string(),
            actual: self.role.to_string(),
        })
    }

    pub fn assert_connection(&self, connection_id: Option<&str>) -> Result<(), ProofError> {
        match (self.connection_id.as_deref(), connection_id) {
            (Some(own), Some(other)) if own != other => Err(ProofError::InvalidConnection {
                record_id: self.base.id(),
                expected: own.to_string(),
                actual: other.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn transition(&mut self, next: ProofState) -> Result<(), ProofError> {
        if !self.state.can_transition_to(next) {
            return Err(ProofError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }

        self.state = next;
        self.base.touch();
        Ok(())
    }

    pub(crate) fn set_verified(&mut self, verified: bool) {
        self.is_verified = Some(verified);
        if !verified {
            self.error_message = Some("presentation verification failed".to_string());
        }
    }

    pub(crate) fn set_auto_accept(&mut self, auto_accept: Option<AutoAcceptProof>) {
        if auto_accept.is_some() {
            self.auto_accept_proof = auto_accept;
        }
    }
}

impl Record for ProofExchangeRecord {
    const RECORD_TYPE: &'static str = "ProofExchangeRecord";

    fn id(&self) -> String {
        self.base.id()
    }

    fn custom_tags(&self) -> &Tags {
        self.base.tags()
    }

    fn default_tags(&self) -> Tags {
        Tags::new()
            .with("threadId", self.thread_id.clone())
            .with("state", self.state.as_str())
            .with("role", self.role.as_str())
            .with_opt("connectionId", self.connection_id.clone())
    }
}

impl ToJSON for ProofExchangeRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        rst_common::standard::serde_json::to_string(self)
            .map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for ProofExchangeRecord {
    type Error = StorageError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        let json = self
            .to_json()
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;
        Ok(json.as_bytes().to_vec())
    }
}

impl TryFrom<Vec<u8>> for ProofExchangeRecord {
    type Error = StorageError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        rst_common::standard::serde_json::from_slice(&value)
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_record() -> ProofExchangeRecord {
        ProofExchangeRecord::new(
            Some("conn-1".to_string()),
            "thread-1".to_string(),
            ProofState::RequestReceived,
            ProofRole::Prover,
        )
        .unwrap()
    }

    #[test]
    fn test_guards_do_not_mutate() {
        let record = generate_record();
        let snapshot = record.clone();

        assert!(record.assert_state(&[ProofState::RequestReceived]).is_ok());
        assert!(matches!(
            record.assert_state(&[ProofState::ProposalSent, ProofState::Done]),
            Err(ProofError::InvalidState { .. })
        ));
        assert!(matches!(
            record.assert_role(ProofRole::Verifier),
            Err(ProofError::InvalidRole { .. })
        ));
        assert_eq!(record, snapshot)
    }

    #[test]
    fn test_verified_flag() {
        let mut record = generate_record();
        assert_eq!(record.is_verified(), None);

        record.set_verified(false);
        assert_eq!(record.is_verified(), Some(false));
        assert!(record.error_message().is_some())
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut record = generate_record();
        record.transition(ProofState::PresentationSent).unwrap();

        let bytes: Result<Vec<u8>, StorageError> = record.clone().try_into();
        let decoded = ProofExchangeRecord::try_from(bytes.unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(
            decoded.tags().get("state").map(|val| val.to_owned()),
            record.default_tags().get("state").map(|val| val.to_owned())
        )
    }
}
