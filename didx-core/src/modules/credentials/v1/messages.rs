use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::agent::message::{AgentMessage, Attachment, MessageHeader};
use crate::modules::credentials::types::{CredentialPreview, CredentialPreviewAttribute};

pub const V1_CREDENTIAL_PREVIEW_TYPE: &str =
    "https://didcomm.org/issue-credential/1.0/credential-preview";

pub fn v1_preview(attributes: Vec<CredentialPreviewAttribute>) -> CredentialPreview {
    CredentialPreview::new(V1_CREDENTIAL_PREVIEW_TYPE, attributes)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1ProposeCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub credential_proposal: Option<CredentialPreview>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub schema_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub cred_def_id: Option<String>,
}

impl AgentMessage for V1ProposeCredentialMessage {
    const MESSAGE_TYPE: &'static str =
        "https://didcomm.org/issue-credential/1.0/propose-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1OfferCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    pub credential_preview: CredentialPreview,

    #[serde(rename = "offers~attach")]
    pub offers_attach: Vec<Attachment>,
}

impl AgentMessage for V1OfferCredentialMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/1.0/offer-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1RequestCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "requests~attach")]
    pub requests_attach: Vec<Attachment>,
}

impl AgentMessage for V1RequestCredentialMessage {
    const MESSAGE_TYPE: &'static str =
        "https://didcomm.org/issue-credential/1.0/request-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1IssueCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "credentials~attach")]
    pub credentials_attach: Vec<Attachment>,
}

impl AgentMessage for V1IssueCredentialMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/1.0/issue-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1CredentialAckMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    pub status: String,
}

impl AgentMessage for V1CredentialAckMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/1.0/ack";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}
