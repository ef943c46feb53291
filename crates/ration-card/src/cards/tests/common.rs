use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cards::{
    AdminWorkflowEngine, ApplicationDetails, CardError, CardId, CardMutation, CardRepository,
    FraudPolicy, InMemoryCardStore, RationCard, RationCardRegistry, RepositoryError,
    SequentialCardNumbers, VerificationAdapter, VerificationError, Verdict,
};
use crate::config::RegistryConfig;
use crate::users::UserId;

/// Returns a fixed verdict.
pub(super) struct StubVerifier(pub(super) Verdict);

impl StubVerifier {
    pub(super) fn genuine() -> Self {
        Self(Verdict::Genuine("GENUINE: details consistent".to_string()))
    }

    pub(super) fn fraud() -> Self {
        Self(Verdict::Fraud(
            "FAKE: aadhaar shared with another household".to_string(),
        ))
    }
}

#[async_trait]
impl VerificationAdapter for StubVerifier {
    async fn verify(&self, _details: &ApplicationDetails) -> Result<Verdict, VerificationError> {
        Ok(self.0.clone())
    }
}

pub(super) struct FailingVerifier;

#[async_trait]
impl VerificationAdapter for FailingVerifier {
    async fn verify(&self, _details: &ApplicationDetails) -> Result<Verdict, VerificationError> {
        Err(VerificationError::Backend("model quota exceeded".to_string()))
    }
}

/// Never answers within any sane timeout.
pub(super) struct StalledVerifier;

#[async_trait]
impl VerificationAdapter for StalledVerifier {
    async fn verify(&self, _details: &ApplicationDetails) -> Result<Verdict, VerificationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Verdict::Genuine("late".to_string()))
    }
}

/// Store whose backing lock is never available.
pub(super) struct UnavailableStore;

impl CardRepository for UnavailableStore {
    fn insert(&self, _card: RationCard) -> Result<RationCard, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &CardId) -> Result<Option<RationCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch_by_user(&self, _user_id: &UserId) -> Result<Option<RationCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn list(&self) -> Result<Vec<RationCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn modify(&self, _id: &CardId, _mutation: CardMutation<'_>) -> Result<RationCard, CardError> {
        Err(CardError::Unavailable("store offline".to_string()))
    }

    fn modify_by_user(
        &self,
        _user_id: &UserId,
        _mutation: CardMutation<'_>,
    ) -> Result<RationCard, CardError> {
        Err(CardError::Unavailable("store offline".to_string()))
    }

    fn remove(&self, _id: &CardId) -> Result<RationCard, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn details() -> ApplicationDetails {
    ApplicationDetails {
        name: "A".to_string(),
        address: "12 Market Road, Ward 4".to_string(),
        family_members: 3,
        aadhaar: "123456789012".to_string(),
        income_proof: "uploads/income.pdf".to_string(),
        photo: "uploads/photo.jpg".to_string(),
    }
}

pub(super) fn registry_config(policy: FraudPolicy) -> RegistryConfig {
    RegistryConfig {
        fraud_policy: policy,
        verification_timeout: Duration::from_millis(250),
        ..RegistryConfig::default()
    }
}

pub(super) struct Harness {
    pub(super) store: Arc<InMemoryCardStore>,
    pub(super) registry: Arc<RationCardRegistry>,
    pub(super) workflow: Arc<AdminWorkflowEngine>,
}

pub(super) fn harness_with(
    verifier: Arc<dyn VerificationAdapter>,
    policy: FraudPolicy,
) -> Harness {
    let store = Arc::new(InMemoryCardStore::default());
    let registry = Arc::new(RationCardRegistry::new(
        store.clone(),
        verifier,
        &registry_config(policy),
    ));
    let workflow = Arc::new(AdminWorkflowEngine::new(
        store.clone(),
        Arc::new(SequentialCardNumbers::new("RC", 1)),
    ));
    Harness {
        store,
        registry,
        workflow,
    }
}

pub(super) fn harness() -> Harness {
    harness_with(Arc::new(StubVerifier::genuine()), FraudPolicy::AutoFlag)
}
