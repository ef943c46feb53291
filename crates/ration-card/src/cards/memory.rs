use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{CardId, RationCard};
use super::error::CardError;
use super::repository::{CardMutation, CardRepository, RepositoryError};
use crate::users::UserId;

/// Process-local card store; one lock serializes every write.
#[derive(Debug, Default)]
pub struct InMemoryCardStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_slot: u64,
    cards: BTreeMap<u64, RationCard>,
    by_id: HashMap<CardId, u64>,
    by_user: HashMap<UserId, u64>,
}

impl StoreState {
    fn slot_of(&self, id: &CardId) -> Option<u64> {
        self.by_id.get(id).copied()
    }

    fn apply(&mut self, slot: u64, mutation: CardMutation<'_>) -> Result<RationCard, CardError> {
        let current = self.cards.get(&slot).ok_or(CardError::NotFound)?;
        let mut working = current.clone();
        mutation(&mut working)?;
        self.cards.insert(slot, working.clone());
        Ok(working)
    }
}

impl InMemoryCardStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("card store lock poisoned".to_string()))
    }
}

impl CardRepository for InMemoryCardStore {
    fn insert(&self, card: RationCard) -> Result<RationCard, RepositoryError> {
        let mut state = self.lock()?;
        if state.by_user.contains_key(&card.user_id) || state.by_id.contains_key(&card.id) {
            return Err(RepositoryError::Conflict);
        }

        let slot = state.next_slot;
        state.next_slot += 1;
        state.by_id.insert(card.id.clone(), slot);
        state.by_user.insert(card.user_id.clone(), slot);
        state.cards.insert(slot, card.clone());
        Ok(card)
    }

    fn fetch(&self, id: &CardId) -> Result<Option<RationCard>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .slot_of(id)
            .and_then(|slot| state.cards.get(&slot))
            .cloned())
    }

    fn fetch_by_user(&self, user_id: &UserId) -> Result<Option<RationCard>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .by_user
            .get(user_id)
            .and_then(|slot| state.cards.get(slot))
            .cloned())
    }

    fn list(&self) -> Result<Vec<RationCard>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.cards.values().cloned().collect())
    }

    fn modify(&self, id: &CardId, mutation: CardMutation<'_>) -> Result<RationCard, CardError> {
        let mut state = self.lock()?;
        let slot = state.slot_of(id).ok_or(CardError::NotFound)?;
        state.apply(slot, mutation)
    }

    fn modify_by_user(
        &self,
        user_id: &UserId,
        mutation: CardMutation<'_>,
    ) -> Result<RationCard, CardError> {
        let mut state = self.lock()?;
        let slot = state
            .by_user
            .get(user_id)
            .copied()
            .ok_or(CardError::NotFound)?;
        state.apply(slot, mutation)
    }

    fn remove(&self, id: &CardId) -> Result<RationCard, RepositoryError> {
        let mut state = self.lock()?;
        let slot = state.by_id.remove(id).ok_or(RepositoryError::NotFound)?;
        let card = state.cards.remove(&slot).ok_or(RepositoryError::NotFound)?;
        state.by_user.remove(&card.user_id);
        Ok(card)
    }
}
