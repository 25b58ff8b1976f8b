use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, PartialEq, Error, Clone)]
pub enum DidDocumentServiceError {
    #[error("missing service field: {0}")]
    MissingField(String),
}

/// `DidDocumentService` is one `service` entry of a DID document, describing where and
/// how a DID subject receives messages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct DidDocumentService {
    id: String,
    service_endpoint: String,

    #[serde(rename = "type")]
    typ: String,
}

impl DidDocumentService {
    pub fn new(
        id: &str,
        service_endpoint: &str,
        typ: &str,
    ) -> Result<Self, DidDocumentServiceError> {
        let fields = [("id", id), ("serviceEndpoint", service_endpoint), ("type", typ)];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DidDocumentServiceError::MissingField(name.to_string()));
        }

        Ok(Self {
            id: id.to_string(),
            service_endpoint: service_endpoint.to_string(),
            typ: typ.to_string(),
        })
    }

    pub fn id(&self) -> String {
        self.id.to_owned()
    }

    pub fn service_endpoint(&self) -> String {
        self.service_endpoint.to_owned()
    }

    pub fn typ(&self) -> String {
        self.typ.to_owned()
    }

    /// `protocol_scheme` is everything in the endpoint before the first `:`, an endpoint
    /// without a colon yields itself
    pub fn protocol_scheme(&self) -> String {
        self.service_endpoint
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}
