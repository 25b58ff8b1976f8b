use rst_common::with_logging::log::debug;

use crate::agent::config::AgentConfig;
use crate::storage::types::Record;

use super::record::ProofExchangeRecord;
use super::types::{requested_names, AutoAcceptProof, ProofPreviews};

/// `ProofResponseCoordinator` decides whether an inbound proof message is answered
/// automatically, the record value wins over the agent default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProofResponseCoordinator {
    default: AutoAcceptProof,
}

impl ProofResponseCoordinator {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            default: config.auto_accept_proofs(),
        }
    }

    pub fn auto_accept(&self, record: &ProofExchangeRecord) -> AutoAcceptProof {
        record.auto_accept_proof().unwrap_or(self.default)
    }

    fn proposal_matches_request(previews: &ProofPreviews) -> bool {
        match (&previews.proposal, &previews.request) {
            (Some(proposal), Some(request)) => {
                proposal.requested_names() == requested_names(request)
            }
            _ => false,
        }
    }

    pub fn should_auto_respond_to_proposal(
        &self,
        record: &ProofExchangeRecord,
        previews: &ProofPreviews,
    ) -> bool {
        self.decide(record, "proposal", Self::proposal_matches_request(previews))
    }

    pub fn should_auto_respond_to_request(
        &self,
        record: &ProofExchangeRecord,
        previews: &ProofPreviews,
    ) -> bool {
        self.decide(record, "request", Self::proposal_matches_request(previews))
    }

    pub fn should_auto_respond_to_presentation(&self, record: &ProofExchangeRecord) -> bool {
        self.decide(record, "presentation", record.is_verified() == Some(true))
    }

    fn decide(&self, record: &ProofExchangeRecord, step: &str, approved: bool) -> bool {
        let auto_accept = self.auto_accept(record);
        debug!(
            "[proofs:coordinator] step: {} | record: {} | auto accept: {:?} | approved: {}",
            step,
            record.id(),
            auto_accept,
            approved
        );

        match auto_accept {
            AutoAcceptProof::Always => true,
            AutoAcceptProof::ContentApproved => approved,
            AutoAcceptProof::Never => false,
        }
    }
}
