use super::domain::{CardId, RationCard};
use super::error::CardError;
use crate::users::UserId;

/// Guarded mutation run by [`CardRepository::modify`] while the record is locked.
pub type CardMutation<'a> = &'a mut (dyn FnMut(&mut RationCard) -> Result<(), CardError> + Send);

/// Storage abstraction for ration cards.
///
/// Implementations must make `insert` atomic with its one-card-per-user check
/// and must serialize `modify` and `remove` per card, so that a mutation sees
/// the latest committed state and nothing else writes the record while it runs.
pub trait CardRepository: Send + Sync {
    /// Stores a new card, failing with `Conflict` if its owner already holds one.
    fn insert(&self, card: RationCard) -> Result<RationCard, RepositoryError>;
    fn fetch(&self, id: &CardId) -> Result<Option<RationCard>, RepositoryError>;
    fn fetch_by_user(&self, user_id: &UserId) -> Result<Option<RationCard>, RepositoryError>;
    /// Every stored card in creation order.
    fn list(&self) -> Result<Vec<RationCard>, RepositoryError>;
    /// Runs `mutation` against a working copy and commits it only on success.
    fn modify(&self, id: &CardId, mutation: CardMutation<'_>) -> Result<RationCard, CardError>;
    /// Same as [`CardRepository::modify`], addressing the card by owner.
    fn modify_by_user(
        &self,
        user_id: &UserId,
        mutation: CardMutation<'_>,
    ) -> Result<RationCard, CardError>;
    fn remove(&self, id: &CardId) -> Result<RationCard, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
