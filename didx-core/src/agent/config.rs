use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::modules::credentials::types::AutoAcceptCredential;
use crate::modules::proofs::types::AutoAcceptProof;

pub const DEFAULT_OUTBOUND_TIMEOUT_MS: u64 = 15000;

/// `DidCommMimeType` is the `Content-Type` used when posting envelopes
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(crate = "self::serde")]
pub enum DidCommMimeType {
    #[serde(rename = "application/ssi-agent-wire")]
    #[default]
    V0,

    #[serde(rename = "application/didcomm-envelope-enc")]
    V1,
}

impl DidCommMimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DidCommMimeType::V0 => "application/ssi-agent-wire",
            DidCommMimeType::V1 => "application/didcomm-envelope-enc",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct AgentConfig {
    pub(crate) label: String,

    #[serde(default)]
    pub(crate) did_comm_mime_type: DidCommMimeType,

    #[serde(default)]
    pub(crate) auto_accept_credentials: AutoAcceptCredential,

    #[serde(default)]
    pub(crate) auto_accept_proofs: AutoAcceptProof,

    #[serde(default = "default_outbound_timeout_ms")]
    pub(crate) outbound_timeout_ms: u64,
}

fn default_outbound_timeout_ms() -> u64 {
    DEFAULT_OUTBOUND_TIMEOUT_MS
}

impl AgentConfig {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn with_auto_accept_credentials(mut self, auto_accept: AutoAcceptCredential) -> Self {
        self.auto_accept_credentials = auto_accept;
        self
    }

    pub fn with_auto_accept_proofs(mut self, auto_accept: AutoAcceptProof) -> Self {
        self.auto_accept_proofs = auto_accept;
        self
    }

    pub fn with_outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_did_comm_mime_type(mut self, mime_type: DidCommMimeType) -> Self {
        self.did_comm_mime_type = mime_type;
        self
    }

    pub fn label(&self) -> String {
        self.label.to_owned()
    }

    pub fn did_comm_mime_type(&self) -> DidCommMimeType {
        self.did_comm_mime_type
    }

    pub fn auto_accept_credentials(&self) -> AutoAcceptCredential {
        self.auto_accept_credentials
    }

    pub fn auto_accept_proofs(&self) -> AutoAcceptProof {
        self.auto_accept_proofs
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_millis(self.outbound_timeout_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            label: "didx-agent".to_string(),
            did_comm_mime_type: DidCommMimeType::default(),
            auto_accept_credentials: AutoAcceptCredential::default(),
            auto_accept_proofs: AutoAcceptProof::default(),
            outbound_timeout_ms: DEFAULT_OUTBOUND_TIMEOUT_MS,
        }
    }
}
