use rst_common::standard::serde_json::Value;

use super::types::{AutoAcceptProof, PresentationPreview};

pub const DEFAULT_PROOF_REQUEST_NAME: &str = "proof-request";
pub const DEFAULT_PROOF_REQUEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct ProposeProofOptions {
    pub connection_id: String,
    pub presentation_proposal: PresentationPreview,
    pub auto_accept_proof: Option<AutoAcceptProof>,
    pub comment: Option<String>,
}

impl ProposeProofOptions {
    pub fn new(connection_id: &str, presentation_proposal: PresentationPreview) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            presentation_proposal,
            auto_accept_proof: None,
            comment: None,
        }
    }
}

/// `AcceptProofProposalOptions` answers a proposal with a proof request generated from
/// the proposed preview
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptProofProposalOptions {
    pub proof_record_id: String,
    pub name: String,
    pub version: String,
    pub auto_accept_proof: Option<AutoAcceptProof>,
    pub comment: Option<String>,
}

impl AcceptProofProposalOptions {
    pub fn new(proof_record_id: &str) -> Self {
        Self {
            proof_record_id: proof_record_id.to_string(),
            name: DEFAULT_PROOF_REQUEST_NAME.to_string(),
            version: DEFAULT_PROOF_REQUEST_VERSION.to_string(),
            auto_accept_proof: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestProofOptions {
    pub connection_id: String,
    pub proof_request: Value,
    pub auto_accept_proof: Option<AutoAcceptProof>,
    pub comment: Option<String>,
}

impl RequestProofOptions {
    pub fn new(connection_id: &str, proof_request: Value) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            proof_request,
            auto_accept_proof: None,
            comment: None,
        }
    }
}

/// `NegotiateProofRequestOptions` is the prover's counter-proposal to a received request
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiateProofRequestOptions {
    pub proof_record_id: String,
    pub presentation_proposal: PresentationPreview,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresentationOptions {
    pub auto_accept_proof: Option<AutoAcceptProof>,
    pub comment: Option<String>,
}
