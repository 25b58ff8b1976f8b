use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::storage::StorageError;

#[derive(Debug, PartialEq, Error, Clone)]
pub enum MediationError {
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("mediation record {record_id} is not ready: expected {expected}, found {actual}")]
    NotReady {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("mediation record {record_id} is in invalid state: expected {expected}, found {actual}")]
    InvalidState {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("mediation record {record_id} has invalid role: expected {expected}, found {actual}")]
    InvalidRole {
        record_id: String,
        expected: String,
        actual: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum MediationState {
    Init,
    Requested,
    Granted,
    Denied,
}

impl MediationState {
    pub const ALL: [MediationState; 4] = [
        MediationState::Init,
        MediationState::Requested,
        MediationState::Granted,
        MediationState::Denied,
    ];

    /// `next_states` is the mediation transition table, a grant or a deny is final
    pub fn next_states(&self) -> &'static [MediationState] {
        use MediationState::*;

        match self {
            Init => &[Requested],
            Requested => &[Granted, Denied],
            Granted | Denied => &[],
        }
    }

    pub fn can_transition_to(&self, next: MediationState) -> bool {
        self.next_states().contains(&next)
    }

    /// `previous_states` lists every state allowed to move into `self`
    pub fn previous_states(&self) -> Vec<MediationState> {
        Self::ALL
            .into_iter()
            .filter(|state| state.can_transition_to(*self))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediationState::Init => "init",
            MediationState::Requested => "requested",
            MediationState::Granted => "granted",
            MediationState::Denied => "denied",
        }
    }
}

impl fmt::Display for MediationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum MediationRole {
    Mediator,
    Recipient,
}

impl MediationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediationRole::Mediator => "mediator",
            MediationRole::Recipient => "recipient",
        }
    }
}

impl fmt::Display for MediationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
