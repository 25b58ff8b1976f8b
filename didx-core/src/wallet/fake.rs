use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{json, Value};

use crate::modules::credentials::types::CredentialPreviewAttribute;

use super::types::{CredentialWallet, ProofWallet, WalletError};

/// Deterministic wallet used by the scenario tests, every payload echoes its inputs
#[derive(Clone, Default)]
pub(crate) struct FakeWallet {
    pub(crate) verified: bool,
}

impl FakeWallet {
    pub(crate) fn new(verified: bool) -> Self {
        Self { verified }
    }
}

#[async_trait]
impl CredentialWallet for FakeWallet {
    async fn create_indy_offer(
        &self,
        credential_definition_id: String,
    ) -> Result<Value, WalletError> {
        Ok(json!({
            "cred_def_id": credential_definition_id,
            "nonce": "1234"
        }))
    }

    async fn create_indy_request(
        &self,
        holder_did: Option<String>,
        offer: Value,
    ) -> Result<Value, WalletError> {
        Ok(json!({
            "prover_did": holder_did,
            "cred_def_id": offer.get("cred_def_id").cloned().unwrap_or(Value::Null),
            "nonce": "5678"
        }))
    }

    async fn create_indy_credential(
        &self,
        offer: Value,
        _request: Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<Value, WalletError> {
        let values: Vec<Value> = attributes
            .iter()
            .map(|attr| json!({"name": attr.name, "raw": attr.value}))
            .collect();

        Ok(json!({
            "cred_def_id": offer.get("cred_def_id").cloned().unwrap_or(Value::Null),
            "values": values
        }))
    }

    async fn store_indy_credential(&self, _credential: Value) -> Result<String, WalletError> {
        Ok("indy-credential-id".to_string())
    }

    async fn sign_w3c_credential(
        &self,
        credential: Value,
        proof_type: String,
    ) -> Result<Value, WalletError> {
        let mut signed = credential;
        if let Some(obj) = signed.as_object_mut() {
            obj.insert("proof".to_string(), json!({"type": proof_type}));
        }

        Ok(signed)
    }

    async fn store_w3c_credential(&self, _credential: Value) -> Result<String, WalletError> {
        Ok("w3c-credential-id".to_string())
    }
}

#[async_trait]
impl ProofWallet for FakeWallet {
    async fn create_presentation(&self, proof_request: Value) -> Result<Value, WalletError> {
        Ok(json!({
            "requested_proof": proof_request
                .get("requested_attributes")
                .cloned()
                .unwrap_or(Value::Null)
        }))
    }

    async fn verify_presentation(
        &self,
        _proof_request: Value,
        _presentation: Value,
    ) -> Result<bool, WalletError> {
        Ok(self.verified)
    }
}
