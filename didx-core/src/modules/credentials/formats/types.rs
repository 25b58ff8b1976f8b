use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::standard::uuid::Uuid;

use crate::agent::message::Attachment;
use crate::modules::credentials::types::{
    CredentialError, CredentialFormat, CredentialFormatType, CredentialPreviewAttribute,
};

/// `CredentialFormatSpec` links an attachment to the format identifier describing its
/// payload, it is the `formats` entry of the v2 messages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialFormatSpec {
    pub attach_id: String,
    pub format: String,
}

/// `FormatAttachment` is the output of a format service step
#[derive(Debug, Clone, PartialEq)]
pub struct FormatAttachment {
    pub format: CredentialFormatSpec,
    pub attachment: Attachment,
}

impl FormatAttachment {
    pub fn new(format_identifier: &str, payload: Value) -> Self {
        let attach_id = Uuid::new_v4().to_string();

        Self {
            format: CredentialFormatSpec {
                attach_id: attach_id.clone(),
                format: format_identifier.to_string(),
            },
            attachment: Attachment::new(attach_id, payload),
        }
    }

    pub fn payload(&self) -> &Value {
        &self.attachment.data.json
    }
}

/// `CredentialFormatService` shapes the attachments of one credential format
///
/// Every payload operation takes the already exchanged payloads as plain values, the
/// protocol service owns the message lookups
#[async_trait]
pub trait CredentialFormatService: Send + Sync {
    fn format_type(&self) -> CredentialFormatType;

    /// `format_from_proposal` rebuilds the format input out of a received proposal
    /// payload, it is what an issuer accepts when the proposal is taken as is
    fn format_from_proposal(
        &self,
        proposal: &Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<CredentialFormat, CredentialError>;

    async fn create_proposal(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError>;

    async fn create_offer(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError>;

    async fn create_request(
        &self,
        offer: &Value,
        holder_did: Option<String>,
    ) -> Result<FormatAttachment, CredentialError>;

    async fn create_credential(
        &self,
        offer: &Value,
        request: &Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<FormatAttachment, CredentialError>;

    /// `process_credential` stores a received credential and returns its wallet id
    async fn process_credential(&self, credential: &Value) -> Result<String, CredentialError>;
}

pub(crate) fn format_mismatch(
    expected: CredentialFormatType,
    actual: &CredentialFormat,
) -> CredentialError {
    CredentialError::FormatMismatch {
        expected: expected.to_string(),
        actual: actual.format_type().to_string(),
    }
}
