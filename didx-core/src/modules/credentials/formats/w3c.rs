use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_logging::log::debug;

use crate::modules::credentials::types::{
    CredentialError, CredentialFormat, CredentialFormatType, CredentialPreviewAttribute,
    W3cCredentialFormat, LD_PROOF_VC_DETAIL_FORMAT, LD_PROOF_VC_FORMAT,
};
use crate::wallet::CredentialWallet;

use super::types::{format_mismatch, CredentialFormatService, FormatAttachment};

/// `W3cCredentialFormatService` exchanges linked data proof credential details, the
/// detail is `{"credential": .., "options": {"proofType": ..}}`
#[derive(Clone)]
pub struct W3cCredentialFormatService {
    wallet: Arc<dyn CredentialWallet>,
}

impl W3cCredentialFormatService {
    pub fn new(wallet: Arc<dyn CredentialWallet>) -> Self {
        Self { wallet }
    }

    fn build_detail(format: &W3cCredentialFormat) -> Value {
        json!({
            "credential": format.credential,
            "options": {
                "proofType": format.proof_type
            }
        })
    }

    fn parse_detail(detail: &Value) -> Result<W3cCredentialFormat, CredentialError> {
        let credential = detail.get("credential").cloned().ok_or_else(|| {
            CredentialError::ValidationError("credential detail without credential".to_string())
        })?;

        let proof_type = detail
            .get("options")
            .and_then(|options| options.get("proofType"))
            .and_then(|proof_type| proof_type.as_str())
            .ok_or_else(|| {
                CredentialError::ValidationError("credential detail without proof type".to_string())
            })?;

        Ok(W3cCredentialFormat {
            credential,
            proof_type: proof_type.to_string(),
        })
    }

    fn detail_from_format(&self, format: &CredentialFormat) -> Result<Value, CredentialError> {
        match format {
            CredentialFormat::W3c(w3c) => Ok(Self::build_detail(w3c)),
            other => Err(format_mismatch(CredentialFormatType::W3c, other)),
        }
    }
}

#[async_trait]
impl CredentialFormatService for W3cCredentialFormatService {
    fn format_type(&self) -> CredentialFormatType {
        CredentialFormatType::W3c
    }

    fn format_from_proposal(
        &self,
        proposal: &Value,
        _attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<CredentialFormat, CredentialError> {
        Self::parse_detail(proposal).map(CredentialFormat::W3c)
    }

    async fn create_proposal(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError> {
        let detail = self.detail_from_format(format)?;
        Ok(FormatAttachment::new(LD_PROOF_VC_DETAIL_FORMAT, detail))
    }

    async fn create_offer(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError> {
        let detail = self.detail_from_format(format)?;
        Ok(FormatAttachment::new(LD_PROOF_VC_DETAIL_FORMAT, detail))
    }

    async fn create_request(
        &self,
        offer: &Value,
        _holder_did: Option<String>,
    ) -> Result<FormatAttachment, CredentialError> {
        let detail = Self::parse_detail(offer)?;
        Ok(FormatAttachment::new(
            LD_PROOF_VC_DETAIL_FORMAT,
            Self::build_detail(&detail),
        ))
    }

    async fn create_credential(
        &self,
        _offer: &Value,
        request: &Value,
        _attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<FormatAttachment, CredentialError> {
        let detail = Self::parse_detail(request)?;
        debug!("[w3c:issue] signing with proof type: {}", detail.proof_type);

        let signed = self
            .wallet
            .sign_w3c_credential(detail.credential, detail.proof_type)
            .await?;

        Ok(FormatAttachment::new(LD_PROOF_VC_FORMAT, signed))
    }

    async fn process_credential(&self, credential: &Value) -> Result<String, CredentialError> {
        let credential_id = self.wallet.store_w3c_credential(credential.clone()).await?;
        debug!("[w3c:store] credential stored: {credential_id}");

        Ok(credential_id)
    }
}
