use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;

use crate::agent::message::{AgentMessage, Attachment, MessageHeader};
use crate::modules::proofs::types::PresentationPreview;

pub const INDY_PROOF_REQUEST_ATTACHMENT_ID: &str = "libindy-request-presentation-0";
pub const INDY_PROOF_ATTACHMENT_ID: &str = "libindy-presentation-0";

fn first_payload(attachments: &[Attachment]) -> Option<&Value> {
    attachments.first().map(|attachment| &attachment.data.json)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1ProposePresentationMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    pub presentation_proposal: PresentationPreview,
}

impl AgentMessage for V1ProposePresentationMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/present-proof/1.0/propose-presentation";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1RequestPresentationMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "request_presentations~attach")]
    pub request_presentations_attach: Vec<Attachment>,
}

impl V1RequestPresentationMessage {
    pub fn new(header: MessageHeader, comment: Option<String>, proof_request: Value) -> Self {
        Self {
            header,
            comment,
            request_presentations_attach: vec![Attachment::new(
                INDY_PROOF_REQUEST_ATTACHMENT_ID.to_string(),
                proof_request,
            )],
        }
    }

    pub fn proof_request(&self) -> Option<&Value> {
        first_payload(&self.request_presentations_attach)
    }
}

impl AgentMessage for V1RequestPresentationMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/present-proof/1.0/request-presentation";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1PresentationMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "presentations~attach")]
    pub presentations_attach: Vec<Attachment>,
}

impl V1PresentationMessage {
    pub fn new(header: MessageHeader, comment: Option<String>, presentation: Value) -> Self {
        Self {
            header,
            comment,
            presentations_attach: vec![Attachment::new(
                INDY_PROOF_ATTACHMENT_ID.to_string(),
                presentation,
            )],
        }
    }

    pub fn presentation(&self) -> Option<&Value> {
        first_payload(&self.presentations_attach)
    }
}

impl AgentMessage for V1PresentationMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/present-proof/1.0/presentation";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct V1PresentationAckMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    pub status: String,
}

impl AgentMessage for V1PresentationAckMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/present-proof/1.0/ack";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let message = V1RequestPresentationMessage::new(
            MessageHeader::new(V1RequestPresentationMessage::MESSAGE_TYPE),
            None,
            json!({"name": "proof-request"}),
        );

        let value = message.to_value().unwrap();
        assert_eq!(
            value["request_presentations~attach"][0]["@id"],
            json!(INDY_PROOF_REQUEST_ATTACHMENT_ID)
        );
        assert_eq!(message.proof_request(), Some(&json!({"name": "proof-request"})));

        let decoded = V1RequestPresentationMessage::from_value(value).unwrap();
        assert_eq!(decoded, message)
    }
}
