use rst_common::with_logging::log::debug;

use crate::agent::config::AgentConfig;
use crate::storage::types::Record;

use super::record::CredentialExchangeRecord;
use super::types::{AutoAcceptCredential, CredentialPreviews};

/// `CredentialResponseCoordinator` decides whether an inbound credential message is
/// answered without waiting for the application
///
/// The auto accept value set on the record wins over the agent default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CredentialResponseCoordinator {
    default: AutoAcceptCredential,
}

impl CredentialResponseCoordinator {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            default: config.auto_accept_credentials(),
        }
    }

    pub fn auto_accept(&self, record: &CredentialExchangeRecord) -> AutoAcceptCredential {
        record.auto_accept_credential().unwrap_or(self.default)
    }

    pub fn should_auto_respond_to_proposal(
        &self,
        record: &CredentialExchangeRecord,
        previews: &CredentialPreviews,
    ) -> bool {
        let approved = match &previews.offer {
            Some(offer) => offer.as_slice() == record.credential_attributes(),
            None => false,
        };

        self.decide(record, "proposal", approved)
    }

    pub fn should_auto_respond_to_offer(
        &self,
        record: &CredentialExchangeRecord,
        previews: &CredentialPreviews,
    ) -> bool {
        let approved = match &previews.proposal {
            Some(proposal) => proposal.as_slice() == record.credential_attributes(),
            None => false,
        };

        self.decide(record, "offer", approved)
    }

    pub fn should_auto_respond_to_request(
        &self,
        record: &CredentialExchangeRecord,
        previews: &CredentialPreviews,
    ) -> bool {
        self.decide(record, "request", previews.offer.is_some())
    }

    pub fn should_auto_respond_to_credential(
        &self,
        record: &CredentialExchangeRecord,
        previews: &CredentialPreviews,
    ) -> bool {
        self.decide(record, "credential", previews.offer.is_some())
    }

    fn decide(&self, record: &CredentialExchangeRecord, step: &str, approved: bool) -> bool {
        let auto_accept = self.auto_accept(record);
        debug!(
            "[credentials:coordinator] step: {} | record: {} | auto accept: {:?} | approved: {}",
            step,
            record.id(),
            auto_accept,
            approved
        );

        match auto_accept {
            AutoAcceptCredential::Always => true,
            AutoAcceptCredential::ContentApproved => approved,
            AutoAcceptCredential::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_test::table_test;

    use crate::modules::credentials::types::{
        CredentialFormatType, CredentialPreviewAttribute, CredentialProtocolVersion,
        CredentialRole, CredentialState,
    };

    fn generate_record(auto_accept: Option<AutoAcceptCredential>) -> CredentialExchangeRecord {
        CredentialExchangeRecord::new(
            Some("conn-1".to_string()),
            "thread-1".to_string(),
            CredentialState::ProposalReceived,
            CredentialRole::Issuer,
            CredentialProtocolVersion::V1,
            CredentialFormatType::Indy,
        )
        .unwrap()
        .with_auto_accept(auto_accept)
        .with_attributes(vec![CredentialPreviewAttribute::new("name", "alice")])
    }

    #[test]
    fn test_record_value_wins_over_default() {
        let coordinator = CredentialResponseCoordinator::new(
            &AgentConfig::default().with_auto_accept_credentials(AutoAcceptCredential::Always),
        );

        let record = generate_record(Some(AutoAcceptCredential::Never));
        assert_eq!(coordinator.auto_accept(&record), AutoAcceptCredential::Never);

        let record = generate_record(None);
        assert_eq!(coordinator.auto_accept(&record), AutoAcceptCredential::Always)
    }

    #[test]
    fn test_should_auto_respond_to_proposal() {
        let same = vec![CredentialPreviewAttribute::new("name", "alice")];
        let other = vec![CredentialPreviewAttribute::new("name", "bob")];

        let table = vec![
            ((AutoAcceptCredential::Always, None), true),
            ((AutoAcceptCredential::Never, Some(same.clone())), false),
            ((AutoAcceptCredential::ContentApproved, Some(same.clone())), true),
            ((AutoAcceptCredential::ContentApproved, Some(other.clone())), false),
            ((AutoAcceptCredential::ContentApproved, None), false),
        ];

        for (validator, (auto_accept, offer), expected) in table_test!(table) {
            let coordinator = CredentialResponseCoordinator::new(&AgentConfig::default());
            let record = generate_record(Some(auto_accept));
            let previews = CredentialPreviews {
                proposal: None,
                offer,
            };

            let actual = coordinator.should_auto_respond_to_proposal(&record, &previews);
            validator
                .given(&format!("{:?}", auto_accept))
                .when("should_auto_respond_to_proposal")
                .then(&format!("it should be: {}", expected))
                .assert_eq(expected, actual);
        }
    }

    #[test]
    fn test_request_and_credential_need_an_offer() {
        let coordinator = CredentialResponseCoordinator::new(
            &AgentConfig::default()
                .with_auto_accept_credentials(AutoAcceptCredential::ContentApproved),
        );
        let record = generate_record(None);

        let without_offer = CredentialPreviews::default();
        assert!(!coordinator.should_auto_respond_to_request(&record, &without_offer));
        assert!(!coordinator.should_auto_respond_to_credential(&record, &without_offer));

        let with_offer = CredentialPreviews {
            proposal: None,
            offer: Some(Vec::new()),
        };
        assert!(coordinator.should_auto_respond_to_request(&record, &with_offer));
        assert!(coordinator.should_auto_respond_to_credential(&record, &with_offer))
    }

    #[test]
    fn test_offer_compares_last_proposal() {
        let coordinator = CredentialResponseCoordinator::new(
            &AgentConfig::default()
                .with_auto_accept_credentials(AutoAcceptCredential::ContentApproved),
        );
        let record = generate_record(None);

        let previews = CredentialPreviews {
            proposal: Some(vec![CredentialPreviewAttribute::new("name", "alice")]),
            offer: None,
        };
        assert!(coordinator.should_auto_respond_to_offer(&record, &previews))
    }
}
