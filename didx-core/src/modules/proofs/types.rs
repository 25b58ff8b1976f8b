use std::collections::BTreeSet;
use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{json, Map, Value};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use crate::agent::context::OutboundMessage;
use crate::agent::message::AgentMessage;
use crate::storage::StorageError;
use crate::wallet::WalletError;

use super::record::ProofExchangeRecord;

pub const PRESENTATION_PREVIEW_TYPE: &str =
    "https://didcomm.org/present-proof/1.0/presentation-preview";

#[derive(Debug, PartialEq, Error, Clone)]
pub enum ProofError {
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("wallet error: {0}")]
    WalletError(#[from] WalletError),

    #[error("proof record {record_id} is in invalid state: expected {expected}, found {actual}")]
    InvalidState {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("proof record {record_id} has invalid role: expected {expected}, found {actual}")]
    InvalidRole {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("proof record {record_id} belongs to connection {expected}, message came from {actual}")]
    InvalidConnection {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("illegal proof state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("thread {thread_id} is closed in state {state}")]
    ThreadClosed { thread_id: String, state: String },

    #[error("message error: {0}")]
    MessageError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "kebab-case")]
pub enum ProofState {
    ProposalSent,
    ProposalReceived,
    RequestSent,
    RequestReceived,
    PresentationSent,
    PresentationReceived,
    Declined,
    Done,
}

impl ProofState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofState::ProposalSent => "proposal-sent",
            ProofState::ProposalReceived => "proposal-received",
            ProofState::RequestSent => "request-sent",
            ProofState::RequestReceived => "request-received",
            ProofState::PresentationSent => "presentation-sent",
            ProofState::PresentationReceived => "presentation-received",
            ProofState::Declined => "declined",
            ProofState::Done => "done",
        }
    }

    pub fn next_states(&self) -> &'static [ProofState] {
        use ProofState::*;

        match self {
            ProposalSent => &[RequestReceived],
            ProposalReceived => &[RequestSent],
            RequestSent => &[ProposalReceived, PresentationReceived],
            RequestReceived => &[ProposalSent, PresentationSent, Declined],
            PresentationSent => &[Done],
            PresentationReceived => &[Done],
            Declined | Done => &[],
        }
    }

    pub fn can_transition_to(&self, next: ProofState) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            ProofState::ProposalSent
                | ProofState::ProposalReceived
                | ProofState::RequestSent
                | ProofState::RequestReceived
        )
    }
}

impl fmt::Display for ProofState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum ProofRole {
    Prover,
    Verifier,
}

impl ProofRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofRole::Prover => "prover",
            ProofRole::Verifier => "verifier",
        }
    }
}

impl fmt::Display for ProofRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub enum AutoAcceptProof {
    Always,
    ContentApproved,
    #[default]
    Never,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct PresentationPreviewAttribute {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub cred_def_id: Option<String>,

    #[serde(rename = "mime-type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub value: Option<String>,
}

impl PresentationPreviewAttribute {
    pub fn new(name: &str, cred_def_id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            cred_def_id: cred_def_id.map(|id| id.to_string()),
            mime_type: None,
            value: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct PresentationPreviewPredicate {
    pub name: String,
    pub cred_def_id: String,
    pub predicate: String,
    pub threshold: i64,
}

/// `PresentationPreview` is what a prover is willing to disclose
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct PresentationPreview {
    #[serde(rename = "@type")]
    pub typ: String,

    pub attributes: Vec<PresentationPreviewAttribute>,

    #[serde(default)]
    pub predicates: Vec<PresentationPreviewPredicate>,
}

impl PresentationPreview {
    pub fn new(
        attributes: Vec<PresentationPreviewAttribute>,
        predicates: Vec<PresentationPreviewPredicate>,
    ) -> Self {
        Self {
            typ: PRESENTATION_PREVIEW_TYPE.to_string(),
            attributes,
            predicates,
        }
    }

    pub fn requested_names(&self) -> BTreeSet<String> {
        self.attributes
            .iter()
            .map(|attr| attr.name.clone())
            .chain(self.predicates.iter().map(|pred| pred.name.clone()))
            .collect()
    }

    /// `to_proof_request` turns the preview into an Indy proof request, one referent per
    /// attribute and per predicate
    pub fn to_proof_request(&self, name: &str, version: &str) -> Value {
        let mut attributes = Map::new();
        for (index, attr) in self.attributes.iter().enumerate() {
            let mut requested = json!({ "name": attr.name });
            if let Some(cred_def_id) = &attr.cred_def_id {
                requested["restrictions"] = json!([{ "cred_def_id": cred_def_id }]);
            }

            attributes.insert(format!("attr_{index}"), requested);
        }

        let mut predicates = Map::new();
        for (index, pred) in self.predicates.iter().enumerate() {
            predicates.insert(
                format!("pred_{index}"),
                json!({
                    "name": pred.name,
                    "p_type": pred.predicate,
                    "p_value": pred.threshold,
                    "restrictions": [{ "cred_def_id": pred.cred_def_id }]
                }),
            );
        }

        json!({
            "name": name,
            "version": version,
            "nonce": Uuid::new_v4().as_u128().to_string(),
            "requested_attributes": attributes,
            "requested_predicates": predicates
        })
    }
}

/// `requested_names` lists the attribute and predicate names asked for by an Indy proof
/// request
pub fn requested_names(proof_request: &Value) -> BTreeSet<String> {
    ["requested_attributes", "requested_predicates"]
        .iter()
        .filter_map(|key| proof_request.get(key).and_then(|entries| entries.as_object()))
        .flat_map(|entries| entries.values())
        .filter_map(|entry| entry.get("name").and_then(|name| name.as_str()))
        .map(|name| name.to_string())
        .collect()
}

/// `ProofProtocolMsgReturn` pairs the updated record with the message to send
#[derive(Debug, Clone, PartialEq)]
pub struct ProofProtocolMsgReturn<TMessage: AgentMessage> {
    pub record: ProofExchangeRecord,
    pub message: TMessage,
}

impl<TMessage: AgentMessage> ProofProtocolMsgReturn<TMessage> {
    pub fn new(record: ProofExchangeRecord, message: TMessage) -> Self {
        Self { record, message }
    }

    pub fn into_outbound(self) -> Result<ProofOutbound, ProofError> {
        let message = OutboundMessage::create(self.record.connection_id(), &self.message)
            .map_err(|err| ProofError::MessageError(err.to_string()))?;

        Ok(ProofOutbound {
            record: self.record,
            message,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProofOutbound {
    pub record: ProofExchangeRecord,
    pub message: OutboundMessage,
}

/// `ProofPreviews` is the last proposal and request stored on a proof record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProofPreviews {
    pub proposal: Option<PresentationPreview>,
    pub request: Option<Value>,
}
