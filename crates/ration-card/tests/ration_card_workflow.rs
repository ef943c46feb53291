//! Integration scenarios for ration card intake, adjudication, and token distribution.
//!
//! Scenarios run through the public capability surfaces so role gating, the card state
//! machine, and partial-failure reporting are exercised the way the HTTP layer uses them.

mod common {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use ration_card::cards::{
        ApplicationDetails, InMemoryCardStore, RandomCardNumbers, VerificationAdapter,
        VerificationError, Verdict,
    };
    use ration_card::config::{DistributionConfig, RegistryConfig};
    use ration_card::tokens::{InMemoryDeliveryLedger, MessageTransport, TransportError};
    use ration_card::users::{InMemoryUserDirectory, User, UserId};
    use ration_card::{PortalPorts, RationPortal, Role};

    pub(super) struct KeywordVerifier;

    #[async_trait]
    impl VerificationAdapter for KeywordVerifier {
        async fn verify(
            &self,
            details: &ApplicationDetails,
        ) -> Result<Verdict, VerificationError> {
            if details.aadhaar == "000000000000" {
                Ok(Verdict::Fraud("FAKE: placeholder aadhaar".to_string()))
            } else {
                Ok(Verdict::Genuine("GENUINE".to_string()))
            }
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryTransport {
        pub(super) blocked: HashSet<String>,
        pub(super) sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageTransport for MemoryTransport {
        async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
            if self.blocked.contains(phone) {
                return Err(TransportError::Unavailable("gateway down".to_string()));
            }
            self.sent
                .lock()
                .expect("transport mutex poisoned")
                .push((phone.to_string(), body.to_string()));
            Ok(())
        }
    }

    pub(super) fn citizen(id: &str, phone: &str) -> User {
        User {
            id: UserId::new(id),
            name: format!("Resident {id}"),
            email: format!("{id}@example.org"),
            phone: phone.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    pub(super) fn details(name: &str, aadhaar: &str) -> ApplicationDetails {
        ApplicationDetails {
            name: name.to_string(),
            address: "12 Market Road, Ward 4".to_string(),
            family_members: 3,
            aadhaar: aadhaar.to_string(),
            income_proof: "uploads/income.pdf".to_string(),
            photo: "uploads/photo.jpg".to_string(),
        }
    }

    pub(super) fn portal(transport: Arc<MemoryTransport>) -> RationPortal {
        let users = InMemoryUserDirectory::with_users([
            citizen("u1", "+919000000001"),
            citizen("u2", "+919000000002"),
        ]);

        RationPortal::from_ports(
            PortalPorts {
                cards: Arc::new(InMemoryCardStore::default()),
                numbers: Arc::new(RandomCardNumbers::new("RC")),
                verifier: Arc::new(KeywordVerifier),
                users: Arc::new(users),
                transport,
                ledger: Arc::new(InMemoryDeliveryLedger::default()),
            },
            &RegistryConfig::default(),
            DistributionConfig::default(),
        )
    }
}

use std::sync::Arc;

use common::*;
use ration_card::cards::{CardError, CardStatus, CardUpdate};
use ration_card::tokens::{DistributionError, DistributionRequest};
use ration_card::users::UserId;
use ration_card::Principal;

#[tokio::test]
async fn card_lifecycle_from_application_to_update() {
    let portal = portal(Arc::new(MemoryTransport::default()));
    let citizen = portal.citizen(&Principal::citizen("u1"));
    let admin = portal
        .admin(&Principal::admin("officer"))
        .expect("admin surface");

    let submission = citizen
        .submit_application(details("A", "123456789012"))
        .await
        .expect("application accepted");
    assert_eq!(submission.card.status(), CardStatus::Pending);
    assert!(submission.card.card_number().is_none());

    let number = admin.approve(&submission.card.id).expect("approval");
    assert_eq!(number.0.len(), 10);
    assert!(number.0.starts_with("RC"));

    let card = citizen.my_card().expect("card visible to owner");
    assert_eq!(card.status(), CardStatus::Approved);
    assert_eq!(card.card_number(), Some(&number));

    let updated = citizen
        .update_card(CardUpdate {
            address: Some("7 Temple Street, Ward 2".to_string()),
            ..CardUpdate::default()
        })
        .expect("update accepted");
    assert_eq!(updated.status(), CardStatus::Approved);
    assert_eq!(updated.card_number(), Some(&number));
    assert_eq!(updated.address, "7 Temple Street, Ward 2");

    assert!(matches!(
        admin.approve(&submission.card.id),
        Err(CardError::InvalidState(_))
    ));
}

#[tokio::test]
async fn fraud_verdict_opens_card_as_fake() {
    let portal = portal(Arc::new(MemoryTransport::default()));
    let citizen = portal.citizen(&Principal::citizen("u2"));

    let submission = citizen
        .submit_application(details("B", "000000000000"))
        .await
        .expect("application accepted");

    assert_eq!(submission.card.status(), CardStatus::Fake);
    let admin = portal
        .admin(&Principal::admin("officer"))
        .expect("admin surface");
    assert!(matches!(
        admin.approve(&submission.card.id),
        Err(CardError::InvalidState(_))
    ));
}

#[tokio::test]
async fn token_distribution_reports_partial_failure() {
    let mut transport = MemoryTransport::default();
    transport.blocked.insert("+919000000002".to_string());
    let transport = Arc::new(transport);
    let portal = portal(transport.clone());
    let admin = portal
        .admin(&Principal::admin("officer"))
        .expect("admin surface");

    let summary = admin
        .distribute_tokens(DistributionRequest {
            user_ids: vec![UserId::new("u1"), UserId::new("u2")],
            message: "Collect ration".to_string(),
            time_slot: "10-12".to_string(),
        })
        .await
        .expect("batch completes");

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_ids, vec![UserId::new("u2")]);

    let sent = transport.sent.lock().expect("transport mutex poisoned").clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "Collect ration\nTime Slot: 10-12");

    let deliveries = admin.deliveries().expect("ledger readable");
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries
        .iter()
        .all(|record| record.batch_id == summary.batch_id));
}

#[tokio::test]
async fn oversized_batches_send_nothing() {
    let transport = Arc::new(MemoryTransport::default());
    let portal = portal(transport.clone());
    let admin = portal
        .admin(&Principal::admin("officer"))
        .expect("admin surface");

    let result = admin
        .distribute_tokens(DistributionRequest {
            user_ids: (0..51).map(|i| UserId::new(format!("u{i}"))).collect(),
            message: "Collect ration".to_string(),
            time_slot: "10-12".to_string(),
        })
        .await;

    assert_eq!(
        result,
        Err(DistributionError::TooManyRecipients { max: 50, found: 51 })
    );
    assert!(transport
        .sent
        .lock()
        .expect("transport mutex poisoned")
        .is_empty());
    assert!(admin.deliveries().expect("ledger readable").is_empty());
}
