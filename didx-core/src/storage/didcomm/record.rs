use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::agent::message::{AgentMessage, MessageType};
use crate::agent::types::AgentError;
use crate::storage::record::BaseRecord;
use crate::storage::types::{Record, StorageError, Tags};

/// `DidCommMessageRole` tells whether the stored message was sent or received by this agent
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum DidCommMessageRole {
    Sender,
    Receiver,
}

impl DidCommMessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DidCommMessageRole::Sender => "sender",
            DidCommMessageRole::Receiver => "receiver",
        }
    }
}

/// `DidCommMessageRecord` stores the literal plaintext of one protocol message, owned by
/// the exchange record given as `associated_record_id`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct DidCommMessageRecord {
    #[serde(flatten)]
    pub(crate) base: BaseRecord,

    pub(crate) role: DidCommMessageRole,

    #[serde(rename = "associatedRecordId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub(crate) associated_record_id: Option<String>,

    pub(crate) message: Value,
}

impl DidCommMessageRecord {
    pub fn new(
        id: Option<String>,
        role: DidCommMessageRole,
        message: Value,
        associated_record_id: Option<String>,
    ) -> Self {
        Self {
            base: BaseRecord::new(id, None, None),
            role,
            associated_record_id,
            message,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    pub fn role(&self) -> DidCommMessageRole {
        self.role
    }

    pub fn associated_record_id(&self) -> Option<String> {
        self.associated_record_id.to_owned()
    }

    pub fn message(&self) -> &Value {
        &self.message
    }

    pub fn message_type(&self) -> Option<String> {
        self.message
            .get("@type")
            .and_then(|typ| typ.as_str())
            .map(|typ| typ.to_string())
    }

    pub(crate) fn replace_message(&mut self, role: DidCommMessageRole, message: Value) {
        self.role = role;
        self.message = message;
        self.base.touch();
    }

    pub fn get_message_instance<TMessage: AgentMessage>(&self) -> Result<TMessage, AgentError> {
        TMessage::from_value(self.message.clone())
    }
}

impl Record for DidCommMessageRecord {
    const RECORD_TYPE: &'static str = "DidCommMessageRecord";

    fn id(&self) -> String {
        self.base.id()
    }

    fn custom_tags(&self) -> &Tags {
        self.base.tags()
    }

    fn default_tags(&self) -> Tags {
        let message_type = self.message_type();
        let mut tags = Tags::new()
            .with("role", self.role.as_str())
            .with_opt("associatedRecordId", self.associated_record_id.clone())
            .with_opt("messageType", message_type.clone());

        if let Some(parsed) = message_type.and_then(|typ| MessageType::parse(&typ).ok()) {
            tags = tags
                .with("protocolName", parsed.protocol_name)
                .with("messageName", parsed.message_name)
                .with(
                    "protocolMajorVersion",
                    parsed.protocol_major_version.to_string(),
                )
                .with(
                    "protocolMinorVersion",
                    parsed.protocol_minor_version.to_string(),
                );
        }

        tags
    }
}

impl ToJSON for DidCommMessageRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        rst_common::standard::serde_json::to_string(self)
            .map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for DidCommMessageRecord {
    type Error = StorageError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        let json = self
            .to_json()
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;
        Ok(json.as_bytes().to_vec())
    }
}

impl TryFrom<Vec<u8>> for DidCommMessageRecord {
    type Error = StorageError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        rst_common::standard::serde_json::from_slice(&value)
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}
