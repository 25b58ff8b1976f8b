use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::storage::record::BaseRecord;
use crate::storage::types::{Record, StorageError, Tags};

use super::types::{
    AutoAcceptCredential, CredentialError, CredentialFormatType, CredentialPreviewAttribute,
    CredentialProtocolVersion, CredentialRole, CredentialState,
};

/// `CredentialExchangeRecord` is the persisted state machine of one credential
/// conversation
///
/// `role` and `thread_id` are fixed at construction, `state` only moves through
/// [`CredentialExchangeRecord::transition`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialExchangeRecord {
    #[serde(flatten)]
    pub(crate) base: BaseRecord,

    #[serde(rename = "connectionId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) connection_id: Option<String>,

    #[serde(rename = "threadId")]
    pub(crate) thread_id: String,

    pub(crate) state: CredentialState,
    pub(crate) role: CredentialRole,

    #[serde(rename = "protocolVersion")]
    pub(crate) protocol_version: CredentialProtocolVersion,

    #[serde(rename = "formatType")]
    pub(crate) format_type: CredentialFormatType,

    #[serde(rename = "autoAcceptCredential")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) auto_accept_credential: Option<AutoAcceptCredential>,

    #[serde(rename = "credentialAttributes")]
    #[serde(default)]
    pub(crate) credential_attributes: Vec<CredentialPreviewAttribute>,

    #[serde(rename = "credentialId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) credential_id: Option<String>,

    #[serde(rename = "errorMessage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

impl CredentialExchangeRecord {
    pub fn new(
        connection_id: Option<String>,
        thread_id: String,
        state: CredentialState,
        role: CredentialRole,
        protocol_version: CredentialProtocolVersion,
        format_type: CredentialFormatType,
    ) -> Result<Self, CredentialError> {
        if !state.is_initial() {
            return Err(CredentialError::InvalidState {
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
            protocol_version,
            format_type,
            auto_accept_credential: None,
            credential_attributes: Vec::new(),
            credential_id: None,
            error_message: None,
        })
    }

    pub fn with_auto_accept(mut self, auto_accept: Option<AutoAcceptCredential>) -> Self {
        self.auto_accept_credential = auto_accept;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<CredentialPreviewAttribute>) -> Self {
        self.credential_attributes = attributes;
        self
    }

    pub fn connection_id(&self) -> Option<String> {
        self.connection_id.to_owned()
    }

    pub fn thread_id(&self) -> String {
        self.thread_id.to_owned()
    }

    pub fn state(&self) -> CredentialState {
        self.state
    }

    pub fn role(&self) -> CredentialRole {
        self.role
    }

    pub fn protocol_version(&self) -> CredentialProtocolVersion {
        self.protocol_version
    }

    pub fn format_type(&self) -> CredentialFormatType {
        self.format_type
    }

    pub fn auto_accept_credential(&self) -> Option<AutoAcceptCredential> {
        self.auto_accept_credential
    }

    pub fn credential_attributes(&self) -> &[CredentialPreviewAttribute] {
        &self.credential_attributes
    }

    pub fn credential_id(&self) -> Option<String> {
        self.credential_id.to_owned()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error_message.to_owned()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.base.updated_at()
    }

    pub fn assert_state(&self, expected: &[CredentialState]) -> Result<(), CredentialError> {
        if expected.contains(&self.state) {
            return Ok(());
        }

        let expected_states: Vec<&str> = expected.iter().map(|state| state.as_str()).collect();
        Err(CredentialError::InvalidState {
            record_id: self.base.id(),
            expected: expected_states.join(", "),
            actual: self.state.to_string(),
        })
    }

    pub fn assert_role(&self, expected: CredentialRole) -> Result<(), CredentialError> {
        if self.role == expected {
            return Ok(());
        }

        Err(CredentialError::InvalidRole {
            record_id: self.base.id(),
            expected: expected.to_string(),
            actual: self.role.to_string(),
        })
    }

    /// `assert_connection` only fails when both sides know their connection and they
    /// differ
    pub fn assert_connection(&self, connection_id: Option<&str>) -> Result<(), CredentialError> {
        match (self.connection_id.as_deref(), connection_id) {
            (Some(own), Some(other)) if own != other => Err(CredentialError::InvalidConnection {
                record_id: self.base.id(),
                expected: own.to_string(),
                actual: other.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn transition(&mut self, next: CredentialState) -> Result<(), CredentialError> {
        if !self.state.can_transition_to(next) {
            return Err(CredentialError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }

        self.state = next;
        self.base.touch();
        Ok(())
    }

    pub(crate) fn set_attributes(&mut self, attributes: Vec<CredentialPreviewAttribute>) {
        self.credential_attributes = attributes;
    }

    pub(crate) fn set_credential_id(&mut self, credential_id: String) {
        self.credential_id = Some(credential_id);
    }

    pub(crate) fn set_auto_accept(&mut self, auto_accept: Option<AutoAcceptCredential>) {
        if auto_accept.is_some() {
            self.auto_accept_credential = auto_accept;
        }
    }
}

impl Record for CredentialExchangeRecord {
    const RECORD_TYPE: &'static str = "CredentialExchangeRecord";

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
            .with("protocolVersion", self.protocol_version.as_str())
            .with_opt("connectionId", self.connection_id.clone())
            .with_opt("credentialId", self.credential_id.clone())
    }
}

impl ToJSON for CredentialExchangeRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        rst_common::standard::serde_json::to_string(self)
            .map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for CredentialExchangeRecord {
    type Error = StorageError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        let json = self
            .to_json()
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;
        Ok(json.as_bytes().to_vec())
    }
}

impl TryFrom<Vec<u8>> for CredentialExchangeRecord {
    type Error = StorageError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        rst_common::standard::serde_json::from_slice(&value)
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}
