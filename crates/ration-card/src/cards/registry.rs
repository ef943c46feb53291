use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::domain::{ApplicationDetails, CardId, CardUpdate, RationCard};
use super::error::CardError;
use super::repository::CardRepository;
use super::verification::{verify_within, FraudPolicy, ScreeningNote, VerificationAdapter};
use crate::config::RegistryConfig;
use crate::users::UserId;

/// Owns citizen-facing card operations: intake, lookup and owner updates.
pub struct RationCardRegistry {
    repository: Arc<dyn CardRepository>,
    verifier: Arc<dyn VerificationAdapter>,
    policy: FraudPolicy,
    verification_timeout: Duration,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub card: RationCard,
    pub screening: ScreeningNote,
}

impl RationCardRegistry {
    pub fn new(
        repository: Arc<dyn CardRepository>,
        verifier: Arc<dyn VerificationAdapter>,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            repository,
            verifier,
            policy: config.fraud_policy,
            verification_timeout: config.verification_timeout,
        }
    }

    /// Validate, screen, and store a new application for `user_id`.
    ///
    /// Screening failures never block the submission; they are recorded as the
    /// verdict text. A fraud verdict opens the card as `fake` when the policy
    /// is [`FraudPolicy::AutoFlag`].
    pub async fn submit_application(
        &self,
        user_id: &UserId,
        details: ApplicationDetails,
    ) -> Result<Submission, CardError> {
        let details = details.validated()?;

        // Skip the screening call for obvious duplicates; the insert below
        // repeats the check atomically.
        if self.repository.fetch_by_user(user_id)?.is_some() {
            return Err(CardError::Conflict);
        }

        let result =
            verify_within(self.verifier.as_ref(), &details, self.verification_timeout).await;
        if let Err(err) = &result {
            warn!(%user_id, error = %err, "application screening unavailable");
        }
        let screening = ScreeningNote::from_result(result);
        let flagged = screening.is_fraud() && self.policy == FraudPolicy::AutoFlag;

        let card = RationCard::open(
            user_id.clone(),
            details,
            Some(screening.details.clone()),
            flagged,
        );
        let card = self.repository.insert(card)?;

        info!(
            card_id = %card.id,
            %user_id,
            status = card.status().label(),
            "ration card application stored"
        );
        Ok(Submission { card, screening })
    }

    pub fn get_by_user(&self, user_id: &UserId) -> Result<RationCard, CardError> {
        self.repository
            .fetch_by_user(user_id)?
            .ok_or(CardError::NotFound)
    }

    pub fn get(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.repository.fetch(card_id)?.ok_or(CardError::NotFound)
    }

    /// Apply owner changes while the card is `pending` or `approved`.
    pub fn update_details(
        &self,
        user_id: &UserId,
        update: CardUpdate,
    ) -> Result<RationCard, CardError> {
        let update = update.validated()?;
        let card = self.repository.modify_by_user(user_id, &mut |card: &mut RationCard| {
            card.revise(update.clone())?;
            Ok(())
        })?;

        info!(card_id = %card.id, %user_id, "ration card details updated");
        Ok(card)
    }

    /// Every stored card in creation order.
    pub fn list_all(&self) -> Result<Vec<RationCard>, CardError> {
        self.repository.list().map_err(CardError::from)
    }
}
