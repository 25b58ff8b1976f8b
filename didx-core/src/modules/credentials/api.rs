use std::sync::Arc;

use rst_common::with_logging::log::debug;

use crate::storage::types::Record;

use super::exchange::CredentialStorage;
use super::options::{
    AcceptOfferOptions, AcceptProposalOptions, AcceptRequestOptions, NegotiateOfferOptions,
    OfferCredentialOptions, ProposeCredentialOptions,
};
use super::record::CredentialExchangeRecord;
use super::repository::CredentialRepository;
use super::service::CredentialService;
use super::types::{CredentialError, CredentialOutbound, CredentialProtocolVersion};
use super::v1::V1CredentialService;
use super::v2::V2CredentialService;

/// `CredentialServiceType` is the closed set of protocol versions, every call answers in
/// the version neutral [`CredentialOutbound`] form
pub enum CredentialServiceType<TStorage: CredentialStorage> {
    V1(Arc<V1CredentialService<TStorage>>),
    V2(Arc<V2CredentialService<TStorage>>),
}

impl<TStorage: CredentialStorage> Clone for CredentialServiceType<TStorage> {
    fn clone(&self) -> Self {
        match self {
            CredentialServiceType::V1(service) => CredentialServiceType::V1(service.clone()),
            CredentialServiceType::V2(service) => CredentialServiceType::V2(service.clone()),
        }
    }
}

impl<TStorage: CredentialStorage> CredentialServiceType<TStorage> {
    pub fn version(&self) -> CredentialProtocolVersion {
        match self {
            CredentialServiceType::V1(_) => CredentialProtocolVersion::V1,
            CredentialServiceType::V2(_) => CredentialProtocolVersion::V2,
        }
    }

    pub async fn create_proposal(
        &self,
        options: ProposeCredentialOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => {
                service.create_proposal(options).await?.into_outbound()
            }
            CredentialServiceType::V2(service) => {
                service.create_proposal(options).await?.into_outbound()
            }
        }
    }

    pub async fn accept_proposal(
        &self,
        options: AcceptProposalOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => {
                service.accept_proposal(options).await?.into_outbound()
            }
            CredentialServiceType::V2(service) => {
                service.accept_proposal(options).await?.into_outbound()
            }
        }
    }

    pub async fn create_offer(
        &self,
        options: OfferCredentialOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => {
                service.create_offer(options).await?.into_outbound()
            }
            CredentialServiceType::V2(service) => {
                service.create_offer(options).await?.into_outbound()
            }
        }
    }

    pub async fn negotiate_offer(
        &self,
        options: NegotiateOfferOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => {
                service.negotiate_offer(options).await?.into_outbound()
            }
            CredentialServiceType::V2(service) => {
                service.negotiate_offer(options).await?.into_outbound()
            }
        }
    }

    pub async fn decline_offer(
        &self,
        credential_record_id: String,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => service.decline_offer(credential_record_id).await,
            CredentialServiceType::V2(service) => service.decline_offer(credential_record_id).await,
        }
    }

    pub async fn accept_offer(
        &self,
        record: CredentialExchangeRecord,
        options: AcceptOfferOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        let request_options = options.request_options();
        match self {
            CredentialServiceType::V1(service) => service
                .create_request(record, request_options)
                .await?
                .into_outbound(),
            CredentialServiceType::V2(service) => service
                .create_request(record, request_options)
                .await?
                .into_outbound(),
        }
    }

    pub async fn accept_request(
        &self,
        options: AcceptRequestOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => {
                service.accept_request(options).await?.into_outbound()
            }
            CredentialServiceType::V2(service) => {
                service.accept_request(options).await?.into_outbound()
            }
        }
    }

    pub async fn accept_credential(
        &self,
        record: CredentialExchangeRecord,
    ) -> Result<CredentialOutbound, CredentialError> {
        match self {
            CredentialServiceType::V1(service) => service.create_ack(record).await?.into_outbound(),
            CredentialServiceType::V2(service) => service.create_ack(record).await?.into_outbound(),
        }
    }
}

/// `CredentialsApi` is the application entry point of credential exchanges
///
/// Starting calls pick the protocol from their options, every later call follows the
/// protocol version stored on the record
#[derive(Clone)]
pub struct CredentialsApi<TStorage: CredentialStorage> {
    v1: CredentialServiceType<TStorage>,
    v2: CredentialServiceType<TStorage>,
    credentials: CredentialRepository<TStorage>,
}

impl<TStorage: CredentialStorage> CredentialsApi<TStorage> {
    pub fn new(
        storage: TStorage,
        v1: Arc<V1CredentialService<TStorage>>,
        v2: Arc<V2CredentialService<TStorage>>,
    ) -> Self {
        Self {
            v1: CredentialServiceType::V1(v1),
            v2: CredentialServiceType::V2(v2),
            credentials: CredentialRepository::new(storage),
        }
    }

    pub fn service(&self, version: CredentialProtocolVersion) -> &CredentialServiceType<TStorage> {
        match version {
            CredentialProtocolVersion::V1 => &self.v1,
            CredentialProtocolVersion::V2 => &self.v2,
        }
    }

    async fn service_for_record(
        &self,
        credential_record_id: &str,
    ) -> Result<(CredentialExchangeRecord, &CredentialServiceType<TStorage>), CredentialError> {
        let record = self.get_by_id(credential_record_id.to_string()).await?;
        let version = record.protocol_version();

        debug!(
            "[credentials:api] record: {} | protocol: {}",
            record.id(),
            version
        );
        Ok((record, self.service(version)))
    }

    pub async fn propose_credential(
        &self,
        options: ProposeCredentialOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        self.service(options.protocol_version)
            .create_proposal(options)
            .await
    }

    pub async fn offer_credential(
        &self,
        options: OfferCredentialOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        self.service(options.protocol_version)
            .create_offer(options)
            .await
    }

    pub async fn accept_proposal(
        &self,
        options: AcceptProposalOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        let (_, service) = self
            .service_for_record(&options.credential_record_id)
            .await?;
        service.accept_proposal(options).await
    }

    pub async fn negotiate_offer(
        &self,
        options: NegotiateOfferOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        let (_, service) = self
            .service_for_record(&options.credential_record_id)
            .await?;
        service.negotiate_offer(options).await
    }

    pub async fn decline_offer(
        &self,
        credential_record_id: &str,
    ) -> Result<CredentialExchangeRecord, CredentialError> {
        let (_, service) = self.service_for_record(credential_record_id).await?;
        service.decline_offer(credential_record_id.to_string()).await
    }

    pub async fn accept_offer(
        &self,
        options: AcceptOfferOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        let (record, service) = self
            .service_for_record(&options.credential_record_id)
            .await?;
        service.accept_offer(record, options).await
    }

    pub async fn accept_request(
        &self,
        options: AcceptRequestOptions,
    ) -> Result<CredentialOutbound, CredentialError> {
        let (_, service) = self
            .service_for_record(&options.credential_record_id)
            .await?;
        service.accept_request(options).await
    }

    pub async fn accept_credential(
        &self,
        credential_record_id: &str,
    ) -> Result<CredentialOutbound, CredentialError> {
        let (record, service) = self.service_for_record(credential_record_id).await?;
        service.accept_credential(record).await
    }

    pub async fn get_by_id(&self, id: String) -> Result<CredentialExchangeRecord, CredentialError> {
        self.credentials.get_by_id(id).await.map_err(CredentialError::from)
    }

    pub async fn get_all(&self) -> Result<Vec<CredentialExchangeRecord>, CredentialError> {
        self.credentials.get_all().await.map_err(CredentialError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use crate::agent::context::{InboundMessageContext, OutboundMessage};
    use crate::agent::message::AgentMessage;
    use crate::modules::credentials::types::{
        CredentialFormat, CredentialFormatType, CredentialPreviewAttribute, CredentialState,
        IndyCredentialFormat,
    };
    use crate::modules::credentials::v2::V2ProposeCredentialMessage;
    use crate::storage::memory::InMemoryStorage;
    use crate::wallet::fake::FakeWallet;

    fn generate_api() -> CredentialsApi<InMemoryStorage> {
        let storage = InMemoryStorage::new();
        let wallet = Arc::new(FakeWallet::default());

        CredentialsApi::new(
            storage.clone(),
            Arc::new(V1CredentialService::new(storage.clone(), wallet.clone())),
            Arc::new(V2CredentialService::new(storage, wallet)),
        )
    }

    fn indy_format() -> CredentialFormat {
        CredentialFormat::Indy(IndyCredentialFormat {
            credential_definition_id: Some("cred-def-1".to_string()),
            schema_id: None,
            attributes: vec![CredentialPreviewAttribute::new("name", "alice")],
        })
    }

    fn to_context<TMessage: AgentMessage>(
        outbound: &OutboundMessage,
        connection_id: &str,
    ) -> InboundMessageContext<TMessage> {
        InboundMessageContext::new(outbound.payload.clone(), Some(connection_id.to_string()))
            .into_typed::<TMessage>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_picks_version_from_options() {
        let api = generate_api();

        let outbound = api
            .propose_credential(ProposeCredentialOptions::new(
                "conn-1",
                CredentialProtocolVersion::V2,
                indy_format(),
            ))
            .await
            .unwrap();

        assert_eq!(
            outbound.message.message_type,
            V2ProposeCredentialMessage::MESSAGE_TYPE
        );
        assert_eq!(outbound.message.connection_id, Some("conn-1".to_string()));
        assert_eq!(
            outbound.record.protocol_version(),
            CredentialProtocolVersion::V2
        );
        assert_eq!(outbound.record.format_type(), CredentialFormatType::Indy)
    }

    #[tokio::test]
    async fn test_followups_use_record_version() {
        let holder = generate_api();
        let issuer = generate_api();

        let proposal = holder
            .propose_credential(ProposeCredentialOptions::new(
                "conn-holder",
                CredentialProtocolVersion::V2,
                indy_format(),
            ))
            .await
            .unwrap();

        let CredentialServiceType::V2(issuer_v2) = issuer.service(CredentialProtocolVersion::V2)
        else {
            panic!("expected the v2 service")
        };
        let issuer_record = issuer_v2
            .process_proposal(to_context(&proposal.message, "conn-issuer"))
            .await
            .unwrap();

        let offer = issuer
            .accept_proposal(AcceptProposalOptions::new(&issuer_record.id()))
            .await
            .unwrap();
        assert_eq!(offer.record.state(), CredentialState::OfferSent);
        assert_eq!(offer.message.thread_id, proposal.message.thread_id)
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let api = generate_api();
        let result = api.decline_offer("missing").await;

        assert!(matches!(
            result.unwrap_err(),
            CredentialError::StorageError(_)
        ))
    }
}
