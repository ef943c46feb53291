//! HTTP surface for citizens and administrators.

pub mod auth;
pub mod error;
pub mod router;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, Authenticated, SessionVerifier, StaticSessions};
pub use error::ApiError;
pub use router::{ration_card_router, ApiState};
