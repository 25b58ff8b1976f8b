use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::agent::context::OutboundMessage;
use crate::agent::message::AgentMessage;
use crate::storage::StorageError;
use crate::wallet::WalletError;

use super::record::CredentialExchangeRecord;

pub const INDY_CRED_FILTER_FORMAT: &str = "hlindy/cred-filter@v2.0";
pub const INDY_CRED_ABSTRACT_FORMAT: &str = "hlindy/cred-abstract@v2.0";
pub const INDY_CRED_REQUEST_FORMAT: &str = "hlindy/cred-req@v2.0";
pub const INDY_CRED_FORMAT: &str = "hlindy/cred@v2.0";
pub const LD_PROOF_VC_DETAIL_FORMAT: &str = "aries/ld-proof-vc-detail@v1.0";
pub const LD_PROOF_VC_FORMAT: &str = "aries/ld-proof-vc@v1.0";

#[derive(Debug, PartialEq, Error, Clone)]
pub enum CredentialError {
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("wallet error: {0}")]
    WalletError(#[from] WalletError),

    #[error("credential record {record_id} is in invalid state: expected {expected}, found {actual}")]
    InvalidState {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("credential record {record_id} has invalid role: expected {expected}, found {actual}")]
    InvalidRole {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("credential record {record_id} belongs to connection {expected}, message came from {actual}")]
    InvalidConnection {
        record_id: String,
        expected: String,
        actual: String,
    },

    #[error("illegal credential state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("thread {thread_id} is closed in state {state}")]
    ThreadClosed { thread_id: String, state: String },

    #[error("unsupported credential format: {0}")]
    UnsupportedFormat(String),

    #[error("credential format mismatch: expected {expected}, found {actual}")]
    FormatMismatch { expected: String, actual: String },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("missing message: {0}")]
    MissingMessage(String),

    #[error("message error: {0}")]
    MessageError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// `CredentialState` covers both roles, the issuer moves through the `*Sent` steps of its
/// own messages and the holder through the `*Received` ones
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "kebab-case")]
pub enum CredentialState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    OfferReceived,
    Declined,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    Done,
}

impl CredentialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialState::ProposalSent => "proposal-sent",
            CredentialState::ProposalReceived => "proposal-received",
            CredentialState::OfferSent => "offer-sent",
            CredentialState::OfferReceived => "offer-received",
            CredentialState::Declined => "declined",
            CredentialState::RequestSent => "request-sent",
            CredentialState::RequestReceived => "request-received",
            CredentialState::CredentialIssued => "credential-issued",
            CredentialState::CredentialReceived => "credential-received",
            CredentialState::Done => "done",
        }
    }

    /// `next_states` is the legal transition table, shared by both protocol versions
    pub fn next_states(&self) -> &'static [CredentialState] {
        use CredentialState::*;

        match self {
            ProposalSent => &[OfferReceived],
            ProposalReceived => &[OfferSent],
            OfferSent => &[ProposalReceived, RequestReceived],
            OfferReceived => &[ProposalSent, RequestSent, Declined],
            RequestSent => &[CredentialReceived],
            RequestReceived => &[CredentialIssued],
            CredentialIssued => &[Done],
            CredentialReceived => &[Done],
            Declined | Done => &[],
        }
    }

    pub fn can_transition_to(&self, next: CredentialState) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Records are only ever created at the first step a role can observe
    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            CredentialState::ProposalSent
                | CredentialState::ProposalReceived
                | CredentialState::OfferSent
                | CredentialState::OfferReceived
        )
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum CredentialRole {
    Holder,
    Issuer,
}

impl CredentialRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialRole::Holder => "holder",
            CredentialRole::Issuer => "issuer",
        }
    }
}

impl fmt::Display for CredentialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum CredentialProtocolVersion {
    V1,
    V2,
}

impl CredentialProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialProtocolVersion::V1 => "v1",
            CredentialProtocolVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for CredentialProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum CredentialFormatType {
    Indy,
    W3c,
}

impl CredentialFormatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialFormatType::Indy => "indy",
            CredentialFormatType::W3c => "w3c",
        }
    }

    /// `from_identifier` maps an attachment format identifier back to its format family
    pub fn from_identifier(identifier: &str) -> Result<Self, CredentialError> {
        match identifier {
            INDY_CRED_FILTER_FORMAT
            | INDY_CRED_ABSTRACT_FORMAT
            | INDY_CRED_REQUEST_FORMAT
            | INDY_CRED_FORMAT => Ok(CredentialFormatType::Indy),
            LD_PROOF_VC_DETAIL_FORMAT | LD_PROOF_VC_FORMAT => Ok(CredentialFormatType::W3c),
            _ => Err(CredentialError::UnsupportedFormat(identifier.to_string())),
        }
    }
}

impl fmt::Display for CredentialFormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub enum AutoAcceptCredential {
    Always,
    ContentApproved,
    #[default]
    Never,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialPreviewAttribute {
    pub name: String,

    #[serde(rename = "mime-type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub mime_type: Option<String>,

    pub value: String,
}

impl CredentialPreviewAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: None,
            value: value.to_string(),
        }
    }
}

/// `CredentialPreview` is the human readable list of attributes carried by proposals
/// and offers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialPreview {
    #[serde(rename = "@type")]
    pub typ: String,

    pub attributes: Vec<CredentialPreviewAttribute>,
}

impl CredentialPreview {
    pub fn new(typ: &str, attributes: Vec<CredentialPreviewAttribute>) -> Self {
        Self {
            typ: typ.to_string(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndyCredentialFormat {
    pub credential_definition_id: Option<String>,
    pub schema_id: Option<String>,
    pub attributes: Vec<CredentialPreviewAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct W3cCredentialFormat {
    pub credential: Value,
    pub proof_type: String,
}

/// `CredentialFormat` is the payload input of an exchange step, the variant decides
/// which format service shapes the attachment
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialFormat {
    Indy(IndyCredentialFormat),
    W3c(W3cCredentialFormat),
}

impl CredentialFormat {
    pub fn format_type(&self) -> CredentialFormatType {
        match self {
            CredentialFormat::Indy(_) => CredentialFormatType::Indy,
            CredentialFormat::W3c(_) => CredentialFormatType::W3c,
        }
    }

    pub fn attributes(&self) -> Vec<CredentialPreviewAttribute> {
        match self {
            CredentialFormat::Indy(indy) => indy.attributes.clone(),
            CredentialFormat::W3c(_) => Vec::new(),
        }
    }
}

/// `CredentialProtocolMsgReturn` pairs the updated record with the message to send
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialProtocolMsgReturn<TMessage: AgentMessage> {
    pub record: CredentialExchangeRecord,
    pub message: TMessage,
}

impl<TMessage: AgentMessage> CredentialProtocolMsgReturn<TMessage> {
    pub fn new(record: CredentialExchangeRecord, message: TMessage) -> Self {
        Self { record, message }
    }

    pub fn into_outbound(self) -> Result<CredentialOutbound, CredentialError> {
        let message = OutboundMessage::create(self.record.connection_id(), &self.message)
            .map_err(|err| CredentialError::MessageError(err.to_string()))?;

        Ok(CredentialOutbound {
            record: self.record,
            message,
        })
    }
}

/// `CredentialOutbound` is the version neutral form of [`CredentialProtocolMsgReturn`]
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialOutbound {
    pub record: CredentialExchangeRecord,
    pub message: OutboundMessage,
}

/// `CredentialPreviews` is what the response coordinator needs to know about the
/// messages already exchanged on a record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CredentialPreviews {
    pub proposal: Option<Vec<CredentialPreviewAttribute>>,
    pub offer: Option<Vec<CredentialPreviewAttribute>>,
}
