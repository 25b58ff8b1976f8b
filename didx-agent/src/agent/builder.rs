use std::sync::Arc;

use didx_core::transport::HttpOutboundTransport;
use didx_core::wallet::{CredentialWallet, ProofWallet};

use crate::common::helpers;
use crate::common::types::CommonError;
use crate::config::Config;
use crate::storage::{Builder as DbBuilder, RocksStorage};

use super::{Agent, EnvelopeService};

/// `Builder` assembles an agent from its configuration: RocksDB storage and the HTTP
/// outbound transport
pub struct Builder {
    cfg: Config,
}

impl Builder {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub async fn build<TWallet>(
        &self,
        wallet: Arc<TWallet>,
        envelope: Arc<dyn EnvelopeService>,
    ) -> Result<Arc<Agent<RocksStorage>>, CommonError>
    where
        TWallet: CredentialWallet + ProofWallet + 'static,
    {
        helpers::validate(self.cfg.clone())?;

        let storage = DbBuilder::new(self.cfg.clone())
            .build(|opts| (opts.db().get_common(), opts.db().get_db_options()))?;

        let transport = Arc::new(HttpOutboundTransport::new(self.cfg.agent()));
        let agent = Arc::new(Agent::new(
            self.cfg.agent().clone(),
            storage,
            wallet,
            envelope,
            transport,
        ));

        agent
            .start()
            .await
            .map_err(|err| CommonError::AgentError(err.to_string()))?;

        Ok(agent)
    }
}
