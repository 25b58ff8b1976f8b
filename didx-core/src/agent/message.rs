use std::fmt::Debug;

use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::standard::uuid::Uuid;

use super::types::AgentError;

/// `ThreadDecorator` is the `~thread` decorator, `thid` correlates every message of one
/// conversation instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde")]
pub struct ThreadDecorator {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub thid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub pthid: Option<String>,
}

/// `MessageHeader` carries the properties every DIDComm message shares
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct MessageHeader {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub typ: String,

    #[serde(rename = "~thread")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub thread: Option<ThreadDecorator>,
}

impl MessageHeader {
    pub fn new(typ: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            typ: typ.to_string(),
            thread: None,
        }
    }

    pub fn with_thread(mut self, thread_id: String) -> Self {
        self.thread = Some(ThreadDecorator {
            thid: Some(thread_id),
            pthid: None,
        });
        self
    }
}

/// `AgentMessage` is the contract of a typed DIDComm plaintext message
///
/// The `MESSAGE_TYPE` uri is also the secondary key used by the message repository
pub trait AgentMessage:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const MESSAGE_TYPE: &'static str;

    fn header(&self) -> &MessageHeader;

    fn id(&self) -> String {
        self.header().id.to_owned()
    }

    fn thread_id(&self) -> String {
        self.header()
            .thread
            .as_ref()
            .and_then(|thread| thread.thid.clone())
            .unwrap_or_else(|| self.id())
    }

    fn to_value(&self) -> Result<Value, AgentError> {
        rst_common::standard::serde_json::to_value(self)
            .map_err(|err| AgentError::MalformedMessage(err.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, AgentError> {
        let typ = value
            .get("@type")
            .and_then(|typ| typ.as_str())
            .ok_or_else(|| AgentError::MalformedMessage("missing @type".to_string()))?;

        if typ != Self::MESSAGE_TYPE {
            return Err(AgentError::UnexpectedMessageType {
                expected: Self::MESSAGE_TYPE.to_string(),
                actual: typ.to_string(),
            });
        }

        rst_common::standard::serde_json::from_value(value)
            .map_err(|err| AgentError::MalformedMessage(err.to_string()))
    }
}

/// `MessageType` is a parsed message type uri
/// `<document-uri>/<protocol-name>/<major>.<minor>/<message-name>`
#[derive(Debug, Clone, PartialEq)]
pub struct MessageType {
    pub document_uri: String,
    pub protocol_name: String,
    pub protocol_major_version: u32,
    pub protocol_minor_version: u32,
    pub message_name: String,
}

impl MessageType {
    pub fn parse(uri: &str) -> Result<Self, AgentError> {
        let parts: Vec<&str> = uri.rsplitn(4, '/').collect();
        if parts.len() != 4 || parts.iter().any(|part| part.is_empty()) {
            return Err(AgentError::InvalidMessageType(uri.to_string()));
        }

        let (major, minor) = parts[1]
            .split_once('.')
            .ok_or_else(|| AgentError::InvalidMessageType(uri.to_string()))?;

        let protocol_major_version = major
            .parse::<u32>()
            .map_err(|_| AgentError::InvalidMessageType(uri.to_string()))?;

        let protocol_minor_version = minor
            .parse::<u32>()
            .map_err(|_| AgentError::InvalidMessageType(uri.to_string()))?;

        Ok(Self {
            document_uri: parts[3].to_string(),
            protocol_name: parts[2].to_string(),
            protocol_major_version,
            protocol_minor_version,
            message_name: parts[0].to_string(),
        })
    }
}

/// `AttachmentData` only carries inline JSON, the payloads exchanged here are already
/// structured values produced by the format services
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct AttachmentData {
    pub json: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Attachment {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "mime-type")]
    #[serde(default = "default_attachment_mime_type")]
    pub mime_type: String,

    pub data: AttachmentData,
}

fn default_attachment_mime_type() -> String {
    "application/json".to_string()
}

impl Attachment {
    pub fn new(id: String, json: Value) -> Self {
        Self {
            id,
            mime_type: default_attachment_mime_type(),
            data: AttachmentData { json },
        }
    }
}
