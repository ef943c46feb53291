//! Ration card intake, status state machine, and administrative adjudication.

pub mod domain;
pub mod error;
pub mod memory;
pub mod numbering;
pub mod registry;
pub mod repository;
pub mod verification;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationDetails, CardAction, CardId, CardNumber, CardStatus, CardUpdate, RationCard,
    TransitionError, ValidationError,
};
pub use error::CardError;
pub use memory::InMemoryCardStore;
pub use numbering::{
    generator_for, CardNumberGenerator, NumberingError, RandomCardNumbers, SequentialCardNumbers,
};
pub use registry::{RationCardRegistry, Submission};
pub use repository::{CardMutation, CardRepository, RepositoryError};
pub use verification::{
    FraudPolicy, ScreeningNote, ScreeningOutcome, VerificationAdapter, VerificationError, Verdict,
};
pub use workflow::AdminWorkflowEngine;
