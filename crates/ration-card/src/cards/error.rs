use super::domain::{TransitionError, ValidationError};
use super::numbering::NumberingError;
use super::repository::RepositoryError;

/// Error raised by the registry and the admin workflow.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("invalid application: {0}")]
    Validation(#[from] ValidationError),
    #[error("user already holds an active ration card")]
    Conflict,
    #[error("ration card not found")]
    NotFound,
    #[error(transparent)]
    InvalidState(#[from] TransitionError),
    #[error(transparent)]
    Numbering(#[from] NumberingError),
    #[error("card store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for CardError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::Conflict,
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Unavailable(message) => Self::Unavailable(message),
        }
    }
}
