use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error, PartialEq)]
pub enum CommonError {
    #[error("dberror: {0}")]
    DbError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("agent error: {0}")]
    AgentError(String),
}

pub trait ToValidate {
    fn validate(&self) -> Result<(), CommonError>;
}
