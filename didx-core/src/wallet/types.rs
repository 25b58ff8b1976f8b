use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::modules::credentials::types::CredentialPreviewAttribute;

#[derive(Debug, PartialEq, Error, Clone)]
pub enum WalletError {
    #[error("wallet error: {0}")]
    OperationError(String),

    #[error("wallet item not found: {0}")]
    NotFound(String),

    #[error("invalid wallet input: {0}")]
    InvalidInput(String),
}

/// `CredentialWallet` is the opaque cryptographic capability consumed by the credential
/// format services. Payloads are treated as structured values, their internal shape
/// belongs to the wallet and the ledger it talks to
#[async_trait]
pub trait CredentialWallet: Send + Sync {
    async fn create_indy_offer(
        &self,
        credential_definition_id: String,
    ) -> Result<Value, WalletError>;

    async fn create_indy_request(
        &self,
        holder_did: Option<String>,
        offer: Value,
    ) -> Result<Value, WalletError>;

    async fn create_indy_credential(
        &self,
        offer: Value,
        request: Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<Value, WalletError>;

    async fn store_indy_credential(&self, credential: Value) -> Result<String, WalletError>;

    async fn sign_w3c_credential(
        &self,
        credential: Value,
        proof_type: String,
    ) -> Result<Value, WalletError>;

    async fn store_w3c_credential(&self, credential: Value) -> Result<String, WalletError>;
}

/// `ProofWallet` builds and checks presentations for the proof exchange
#[async_trait]
pub trait ProofWallet: Send + Sync {
    async fn create_presentation(&self, proof_request: Value) -> Result<Value, WalletError>;

    async fn verify_presentation(
        &self,
        proof_request: Value,
        presentation: Value,
    ) -> Result<bool, WalletError>;
}
