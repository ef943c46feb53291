use std::sync::Arc;

use tracing::info;

use super::domain::{CardAction, CardId, CardNumber, RationCard};
use super::error::CardError;
use super::numbering::CardNumberGenerator;
use super::repository::CardRepository;

/// Administrator-initiated transitions over stored cards.
///
/// Every transition runs as a guarded store mutation, so concurrent calls on
/// the same card are serialized and exactly one of them can leave `pending`.
pub struct AdminWorkflowEngine {
    repository: Arc<dyn CardRepository>,
    numbers: Arc<dyn CardNumberGenerator>,
}

impl AdminWorkflowEngine {
    pub fn new(
        repository: Arc<dyn CardRepository>,
        numbers: Arc<dyn CardNumberGenerator>,
    ) -> Self {
        Self {
            repository,
            numbers,
        }
    }

    /// Approve a pending card and return the number issued to it.
    ///
    /// The number is drawn only after the status check passes, inside the
    /// same guarded mutation that records it.
    pub fn approve(&self, card_id: &CardId) -> Result<CardNumber, CardError> {
        let card = self
            .repository
            .modify(card_id, &mut |card: &mut RationCard| {
                card.check(CardAction::Approve)?;
                let number = self.numbers.next()?;
                card.approve(number)?;
                Ok(())
            })?;

        let number = card.card_number().cloned().ok_or_else(|| {
            CardError::Unavailable("approved card was stored without a number".to_string())
        })?;
        info!(%card_id, card_number = %number, "ration card approved");
        Ok(number)
    }

    pub fn reject(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.settle(card_id, CardAction::Reject)
    }

    /// Manual fraud override for a pending card.
    pub fn flag_fake(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.settle(card_id, CardAction::FlagFake)
    }

    /// Remove a card in any status, freeing its owner to apply again.
    pub fn delete_card(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        let removed = self.repository.remove(card_id)?;
        info!(
            %card_id,
            user_id = %removed.user_id,
            status = removed.status().label(),
            "ration card deleted"
        );
        Ok(removed)
    }

    fn settle(&self, card_id: &CardId, action: CardAction) -> Result<RationCard, CardError> {
        let card = self
            .repository
            .modify(card_id, &mut |card: &mut RationCard| {
                card.settle(action)?;
                Ok(())
            })?;

        info!(%card_id, status = card.status().label(), "ration card settled");
        Ok(card)
    }
}
