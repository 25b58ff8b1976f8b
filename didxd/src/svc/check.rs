use rst_common::with_logging::log::info;

use didx_agent::common::helpers;
use didx_agent::config::{Config, Parser};

use crate::errors::DaemonError;

/// `Check` parses a configuration file and runs every section validation
pub struct Check {
    config: String,
}

impl Check {
    pub fn new(config: String) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<Config, DaemonError> {
        let config = Parser::new(self.config.to_owned())
            .parse()
            .map_err(|err| DaemonError::ConfigError(err.to_string()))?;

        helpers::validate(config.clone())
            .map_err(|err| DaemonError::ConfigError(err.to_string()))?;

        info!("[didxd:check] config file is valid: {}", self.config);
        Ok(config)
    }

    pub fn summary(config: &Config) -> Vec<(String, String)> {
        let agent = config.agent();
        let (db_path, cf_name) = config.db().get_common().get();

        vec![
            ("label".to_string(), agent.label()),
            (
                "did_comm_mime_type".to_string(),
                agent.did_comm_mime_type().as_str().to_string(),
            ),
            (
                "auto_accept_credentials".to_string(),
                format!("{:?}", agent.auto_accept_credentials()),
            ),
            (
                "auto_accept_proofs".to_string(),
                format!("{:?}", agent.auto_accept_proofs()),
            ),
            (
                "outbound_timeout_ms".to_string(),
                agent.outbound_timeout().as_millis().to_string(),
            ),
            ("database_path".to_string(), db_path),
            ("database_cf_name".to_string(), cf_name),
        ]
    }
}
