use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::agent::message::{AgentMessage, MessageHeader};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInvitationMessage {
    #[serde(flatten)]
    pub header: MessageHeader,

    pub label: String,

    #[serde(default)]
    pub recipient_keys: Vec<String>,

    pub service_endpoint: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub routing_keys: Vec<String>,
}

impl ConnectionInvitationMessage {
    pub fn new(label: &str, recipient_keys: Vec<String>, service_endpoint: &str) -> Self {
        Self {
            header: MessageHeader::new(Self::MESSAGE_TYPE),
            label: label.to_string(),
            recipient_keys,
            service_endpoint: service_endpoint.to_string(),
            routing_keys: Vec::new(),
        }
    }

    pub fn with_routing_keys(mut self, routing_keys: Vec<String>) -> Self {
        self.routing_keys = routing_keys;
        self
    }
}

impl AgentMessage for ConnectionInvitationMessage {
    const MESSAGE_TYPE: &'static str = "https://didcomm.org/connections/1.0/invitation";

    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    #[test]
    fn test_decode_invitation() {
        let value = json!({
            "@type": "https://didcomm.org/connections/1.0/invitation",
            "@id": "04a2c382-999e-4de9-a1d2-9dec0b2fa5e4",
            "recipientKeys": ["recipientKeyOne", "recipientKeyTwo"],
            "serviceEndpoint": "https://example.com",
            "label": "test"
        });

        let invitation = ConnectionInvitationMessage::from_value(value.clone());
        assert!(invitation.is_ok());

        let invitation = invitation.unwrap();
        assert_eq!(invitation.id(), "04a2c382-999e-4de9-a1d2-9dec0b2fa5e4");
        assert_eq!(invitation.recipient_keys.len(), 2);
        assert_eq!(invitation.to_value().unwrap(), value)
    }

    #[test]
    fn test_reject_other_message_type() {
        let value = json!({
            "@type": "https://didcomm.org/trust-ping/1.0/ping",
            "@id": "1",
            "serviceEndpoint": "https://example.com",
            "label": "test"
        });

        assert!(ConnectionInvitationMessage::from_value(value).is_err())
    }
}
