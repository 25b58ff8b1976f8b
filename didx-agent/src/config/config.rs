use rst_common::standard::serde::{self, Deserialize};

use didx_core::agent::AgentConfig;

use crate::common::types::{CommonError, ToValidate};

use super::Database;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) agent: AgentConfig,
    pub(super) database: Database,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn db(&self) -> &Database {
        &self.database
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        self.agent.validate()?;
        self.database.validate()?;

        Ok(())
    }
}
