//! `credentials` drives the issue-credential protocol in both of its versions
//!
//! v1 exchanges Indy credentials only, v2 carries a `formats` list and supports Indy
//! and W3C linked data credentials through the [`formats`] services
pub mod api;
pub mod coordinator;
pub mod exchange;
pub mod formats;
pub mod handlers;
pub mod options;
pub mod record;
pub mod repository;
pub mod service;
pub mod types;
pub mod v1;
pub mod v2;

pub use api::{CredentialServiceType, CredentialsApi};
pub use coordinator::CredentialResponseCoordinator;
pub use exchange::{CredentialExchange, CredentialStorage};
pub use record::CredentialExchangeRecord;
pub use repository::CredentialRepository;
pub use service::CredentialService;
pub use types::{
    AutoAcceptCredential, CredentialError, CredentialFormat, CredentialFormatType,
    CredentialProtocolVersion, CredentialRole, CredentialState,
};
