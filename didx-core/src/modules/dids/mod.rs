pub mod types;

pub use types::{DidDocumentService, DidDocumentServiceError};
