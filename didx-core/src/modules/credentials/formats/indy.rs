use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_logging::log::debug;

use crate::modules::credentials::types::{
    CredentialError, CredentialFormat, CredentialFormatType, CredentialPreviewAttribute,
    IndyCredentialFormat, INDY_CRED_ABSTRACT_FORMAT, INDY_CRED_FILTER_FORMAT, INDY_CRED_FORMAT,
    INDY_CRED_REQUEST_FORMAT,
};
use crate::wallet::CredentialWallet;

use super::types::{format_mismatch, CredentialFormatService, FormatAttachment};

#[derive(Clone)]
pub struct IndyCredentialFormatService {
    wallet: Arc<dyn CredentialWallet>,
}

impl IndyCredentialFormatService {
    pub fn new(wallet: Arc<dyn CredentialWallet>) -> Self {
        Self { wallet }
    }

    fn unwrap_format<'a>(
        &self,
        format: &'a CredentialFormat,
    ) -> Result<&'a IndyCredentialFormat, CredentialError> {
        match format {
            CredentialFormat::Indy(indy) => Ok(indy),
            other => Err(format_mismatch(CredentialFormatType::Indy, other)),
        }
    }

    fn read_text(payload: &Value, key: &str) -> Option<String> {
        payload
            .get(key)
            .and_then(|val| val.as_str())
            .map(|val| val.to_string())
    }
}

#[async_trait]
impl CredentialFormatService for IndyCredentialFormatService {
    fn format_type(&self) -> CredentialFormatType {
        CredentialFormatType::Indy
    }

    fn format_from_proposal(
        &self,
        proposal: &Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<CredentialFormat, CredentialError> {
        Ok(CredentialFormat::Indy(IndyCredentialFormat {
            credential_definition_id: Self::read_text(proposal, "cred_def_id"),
            schema_id: Self::read_text(proposal, "schema_id"),
            attributes,
        }))
    }

    async fn create_proposal(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError> {
        let indy = self.unwrap_format(format)?;

        let mut filter = json!({});
        if let Some(obj) = filter.as_object_mut() {
            if let Some(cred_def_id) = &indy.credential_definition_id {
                obj.insert("cred_def_id".to_string(), json!(cred_def_id));
            }

            if let Some(schema_id) = &indy.schema_id {
                obj.insert("schema_id".to_string(), json!(schema_id));
            }
        }

        Ok(FormatAttachment::new(INDY_CRED_FILTER_FORMAT, filter))
    }

    async fn create_offer(
        &self,
        format: &CredentialFormat,
    ) -> Result<FormatAttachment, CredentialError> {
        let indy = self.unwrap_format(format)?;
        let cred_def_id = indy.credential_definition_id.clone().ok_or_else(|| {
            CredentialError::ValidationError(
                "indy offer requires a credential definition id".to_string(),
            )
        })?;

        debug!("[indy:offer] credential definition: {cred_def_id}");
        let offer = self.wallet.create_indy_offer(cred_def_id).await?;
        Ok(FormatAttachment::new(INDY_CRED_ABSTRACT_FORMAT, offer))
    }

    async fn create_request(
        &self,
        offer: &Value,
        holder_did: Option<String>,
    ) -> Result<FormatAttachment, CredentialError> {
        let request = self
            .wallet
            .create_indy_request(holder_did, offer.clone())
            .await?;

        Ok(FormatAttachment::new(INDY_CRED_REQUEST_FORMAT, request))
    }

    async fn create_credential(
        &self,
        offer: &Value,
        request: &Value,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<FormatAttachment, CredentialError> {
        let credential = self
            .wallet
            .create_indy_credential(offer.clone(), request.clone(), attributes)
            .await?;

        Ok(FormatAttachment::new(INDY_CRED_FORMAT, credential))
    }

    async fn process_credential(&self, credential: &Value) -> Result<String, CredentialError> {
        let credential_id = self.wallet.store_indy_credential(credential.clone()).await?;
        debug!("[indy:store] credential stored: {credential_id}");

        Ok(credential_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    use rst_common::with_tokio::tokio;

    use crate::modules::credentials::types::W3cCredentialFormat;
    use crate::wallet::WalletError;

    mock!(
        FakeWallet{}

        #[async_trait]
        impl CredentialWallet for FakeWallet {
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
    );

    fn indy_format(cred_def_id: Option<&str>) -> CredentialFormat {
        CredentialFormat::Indy(IndyCredentialFormat {
            credential_definition_id: cred_def_id.map(|id| id.to_string()),
            schema_id: Some("schema-1".to_string()),
            attributes: vec![CredentialPreviewAttribute::new("name", "alice")],
        })
    }

    #[tokio::test]
    async fn test_create_proposal_filter() {
        let service = IndyCredentialFormatService::new(Arc::new(MockFakeWallet::new()));
        let attachment = service
            .create_proposal(&indy_format(Some("cred-def-1")))
            .await
            .unwrap();

        assert_eq!(attachment.format.format, INDY_CRED_FILTER_FORMAT);
        assert_eq!(attachment.format.attach_id, attachment.attachment.id);
        assert_eq!(
            attachment.payload(),
            &json!({"cred_def_id": "cred-def-1", "schema_id": "schema-1"})
        )
    }

    #[tokio::test]
    async fn test_create_offer_through_wallet() {
        let mut wallet = MockFakeWallet::new();
        wallet
            .expect_create_indy_offer()
            .with(eq("cred-def-1".to_string()))
            .times(1)
            .returning(|_| Ok(json!({"nonce": "1"})));

        let service = IndyCredentialFormatService::new(Arc::new(wallet));
        let attachment = service
            .create_offer(&indy_format(Some("cred-def-1")))
            .await
            .unwrap();

        assert_eq!(attachment.format.format, INDY_CRED_ABSTRACT_FORMAT);
        assert_eq!(attachment.payload(), &json!({"nonce": "1"}))
    }

    #[tokio::test]
    async fn test_create_offer_requires_definition() {
        let mut wallet = MockFakeWallet::new();
        wallet.expect_create_indy_offer().never();

        let service = IndyCredentialFormatService::new(Arc::new(wallet));
        let result = service.create_offer(&indy_format(None)).await;

        assert!(matches!(
            result.unwrap_err(),
            CredentialError::ValidationError(_)
        ))
    }

    #[tokio::test]
    async fn test_reject_w3c_input() {
        let service = IndyCredentialFormatService::new(Arc::new(MockFakeWallet::new()));
        let format = CredentialFormat::W3c(W3cCredentialFormat {
            credential: json!({}),
            proof_type: "Ed25519Signature2018".to_string(),
        });

        let result = service.create_proposal(&format).await;
        assert_eq!(
            result.unwrap_err(),
            CredentialError::FormatMismatch {
                expected: "indy".to_string(),
                actual: "w3c".to_string(),
            }
        )
    }

    #[tokio::test]
    async fn test_wallet_failure_propagates() {
        let mut wallet = MockFakeWallet::new();
        wallet
            .expect_store_indy_credential()
            .returning(|_| Err(WalletError::OperationError("locked".to_string())));

        let service = IndyCredentialFormatService::new(Arc::new(wallet));
        let result = service.process_credential(&json!({})).await;

        assert!(matches!(
            result.unwrap_err(),
            CredentialError::WalletError(_)
        ))
    }
}
