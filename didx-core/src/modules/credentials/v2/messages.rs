use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::agent::message::{AgentMessage, Attachment, MessageHeader};
use crate::modules::credentials::formats::{CredentialFormatSpec, FormatAttachment};
use crate::modules::credentials::types::{
    CredentialError, CredentialFormatType, CredentialPreview, CredentialPreviewAttribute,
};

pub const V2_CREDENTIAL_PREVIEW_TYPE: &str =
    "https://didcomm.org/issue-credential/2.0/credential-preview";

pub fn v2_preview(attributes: Vec<CredentialPreviewAttribute>) -> CredentialPreview {
    CredentialPreview::new(V2_CREDENTIAL_PREVIEW_TYPE, attributes)
}

/// `FormattedAttachments` gives every v2 message the same view over its `formats` list
/// and the attachment each entry points to
pub trait FormattedAttachments {
    fn formats(&self) -> &[CredentialFormatSpec];
    fn attachments(&self) -> &[Attachment];

    fn format_type(&self) -> Result<CredentialFormatType, CredentialError> {
        let spec = self.formats().first().ok_or_else(|| {
            CredentialError::ValidationError("message without formats".to_string())
        })?;

        CredentialFormatType::from_identifier(&spec.format)
    }

    fn attachment_for(
        &self,
        format_type: CredentialFormatType,
    ) -> Result<&Attachment, CredentialError> {
        let spec = self
            .formats()
            .iter()
            .find(|spec| {
                CredentialFormatType::from_identifier(&spec.format)
                    .map(|found| found == format_type)
                    .unwrap_or(false)
            })
            .ok_or_else(|| CredentialError::UnsupportedFormat(format_type.to_string()))?;

        self.attachments()
            .iter()
            .find(|attachment| attachment.id == spec.attach_id)
            .ok_or_else(|| {
                CredentialError::ValidationError(format!(
                    "missing attachment: {}",
                    spec.attach_id
                ))
            })
    }
}

fn split_attachment(attachment: FormatAttachment) -> (Vec<CredentialFormatSpec>, Vec<Attachment>) {
    (vec![attachment.format], vec![attachment.attachment])
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V2ProposeCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub credential_preview: Option<CredentialPreview>,

    pub formats: Vec<CredentialFormatSpec>,

    #[serde(rename = "filters~attach")]
    pub filters_attach: Vec<Attachment>,
}

impl V2ProposeCredentialMessage {
    pub fn new(
        header: MessageHeader,
        comment: Option<String>,
        credential_preview: Option<CredentialPreview>,
        attachment: FormatAttachment,
    ) -> Self {
        let (formats, filters_attach) = split_attachment(attachment);
        Self {
            header,
            comment,
            credential_preview,
            formats,
            filters_attach,
        }
    }
}

impl FormattedAttachments for V2ProposeCredentialMessage {
    fn formats(&self) -> &[CredentialFormatSpec] {
        &self.formats
    }

    fn attachments(&self) -> &[Attachment] {
        &self.filters_attach
    }
}

impl AgentMessage for V2ProposeCredentialMessage {
    const MESSAGE_TYPE: &'static str =
        "https://didcomm.org/issue-credential/2.0/propose-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V2OfferCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub credential_preview: Option<CredentialPreview>,

    pub formats: Vec<CredentialFormatSpec>,

    #[serde(rename = "offers~attach")]
    pub offers_attach: Vec<Attachment>,
}

impl V2OfferCredentialMessage {
    pub fn new(
        header: MessageHeader,
        comment: Option<String>,
        credential_preview: Option<CredentialPreview>,
        attachment: FormatAttachment,
    ) -> Self {
        let (formats, offers_attach) = split_attachment(attachment);
        Self {
            header,
            comment,
            credential_preview,
            formats,
            offers_attach,
        }
    }
}

impl FormattedAttachments for V2OfferCredentialMessage {
    fn formats(&self) -> &[CredentialFormatSpec] {
        &self.formats
    }

    fn attachments(&self) -> &[Attachment] {
        &self.offers_attach
    }
}

impl AgentMessage for V2OfferCredentialMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/2.0/offer-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V2RequestCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    pub formats: Vec<CredentialFormatSpec>,

    #[serde(rename = "requests~attach")]
    pub requests_attach: Vec<Attachment>,
}

impl V2RequestCredentialMessage {
    pub fn new(
        header: MessageHeader,
        comment: Option<String>,
        attachment: FormatAttachment,
    ) -> Self {
        let (formats, requests_attach) = split_attachment(attachment);
        Self {
            header,
            comment,
            formats,
            requests_attach,
        }
    }
}

impl FormattedAttachments for V2RequestCredentialMessage {
    fn formats(&self) -> &[CredentialFormatSpec] {
        &self.formats
    }

    fn attachments(&self) -> &[Attachment] {
        &self.requests_attach
    }
}

impl AgentMessage for V2RequestCredentialMessage {
    const MESSAGE_TYPE: &'static str =
        "https://didcomm.org/issue-credential/2.0/request-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V2IssueCredentialMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    pub formats: Vec<CredentialFormatSpec>,

    #[serde(rename = "credentials~attach")]
    pub credentials_attach: Vec<Attachment>,
}

impl V2IssueCredentialMessage {
    pub fn new(
        header: MessageHeader,
        comment: Option<String>,
        attachment: FormatAttachment,
    ) -> Self {
        let (formats, credentials_attach) = split_attachment(attachment);
        Self {
            header,
            comment,
            formats,
            credentials_attach,
        }
    }
}

impl FormattedAttachments for V2IssueCredentialMessage {
    fn formats(&self) -> &[CredentialFormatSpec] {
        &self.formats
    }

    fn attachments(&self) -> &[Attachment] {
        &self.credentials_attach
    }
}

impl AgentMessage for V2IssueCredentialMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/2.0/issue-credential";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V2CredentialAckMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    pub status: String,
}

impl AgentMessage for V2CredentialAckMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/issue-credential/2.0/ack";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}
