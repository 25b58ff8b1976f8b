use didx_core::agent::AgentConfig;

use crate::common::types::{CommonError, ToValidate};

impl ToValidate for AgentConfig {
    fn validate(&self) -> Result<(), CommonError> {
        if self.label().trim().is_empty() {
            return Err(CommonError::ValidationError(
                "config: agent:label is missing".to_string(),
            ));
        }

        if self.outbound_timeout().is_zero() {
            return Err(CommonError::ValidationError(
                "config: agent:outbound_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
