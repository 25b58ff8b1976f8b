use super::types::{AutoAcceptCredential, CredentialFormat, CredentialProtocolVersion};

#[derive(Debug, Clone, PartialEq)]
pub struct ProposeCredentialOptions {
    pub connection_id: String,
    pub protocol_version: CredentialProtocolVersion,
    pub credential_format: CredentialFormat,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

impl ProposeCredentialOptions {
    pub fn new(
        connection_id: &str,
        protocol_version: CredentialProtocolVersion,
        credential_format: CredentialFormat,
    ) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            protocol_version,
            credential_format,
            auto_accept_credential: None,
            comment: None,
        }
    }
}

/// `AcceptProposalOptions` answers a received proposal with an offer. Without an explicit
/// format the offer is built from the proposal itself
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptProposalOptions {
    pub credential_record_id: String,
    pub credential_format: Option<CredentialFormat>,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

impl AcceptProposalOptions {
    pub fn new(credential_record_id: &str) -> Self {
        Self {
            credential_record_id: credential_record_id.to_string(),
            credential_format: None,
            auto_accept_credential: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferCredentialOptions {
    pub connection_id: String,
    pub protocol_version: CredentialProtocolVersion,
    pub credential_format: CredentialFormat,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

impl OfferCredentialOptions {
    pub fn new(
        connection_id: &str,
        protocol_version: CredentialProtocolVersion,
        credential_format: CredentialFormat,
    ) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            protocol_version,
            credential_format,
            auto_accept_credential: None,
            comment: None,
        }
    }
}

/// `NegotiateOfferOptions` is the holder's counter-proposal to a received offer
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiateOfferOptions {
    pub credential_record_id: String,
    pub credential_format: CredentialFormat,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestCredentialOptions {
    pub holder_did: Option<String>,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptOfferOptions {
    pub credential_record_id: String,
    pub holder_did: Option<String>,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

impl AcceptOfferOptions {
    pub fn new(credential_record_id: &str) -> Self {
        Self {
            credential_record_id: credential_record_id.to_string(),
            holder_did: None,
            auto_accept_credential: None,
            comment: None,
        }
    }

    pub fn request_options(&self) -> RequestCredentialOptions {
        RequestCredentialOptions {
            holder_did: self.holder_did.clone(),
            auto_accept_credential: self.auto_accept_credential,
            comment: self.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptRequestOptions {
    pub credential_record_id: String,
    pub auto_accept_credential: Option<AutoAcceptCredential>,
    pub comment: Option<String>,
}

impl AcceptRequestOptions {
    pub fn new(credential_record_id: &str) -> Self {
        Self {
            credential_record_id: credential_record_id.to_string(),
            auto_accept_credential: None,
            comment: None,
        }
    }
}
