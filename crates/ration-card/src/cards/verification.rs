use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::ApplicationDetails;

/// Screening answer returned by the fraud-detection capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Descriptive verdict kept verbatim for the reviewing administrator.
    Genuine(String),
    /// Explicit fraud signal along with the screener's explanation.
    Fraud(String),
}

/// External fraud screening consulted during intake.
#[async_trait]
pub trait VerificationAdapter: Send + Sync {
    async fn verify(&self, details: &ApplicationDetails) -> Result<Verdict, VerificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("verification backend failed: {0}")]
    Backend(String),
    #[error("verification timed out after {0:?}")]
    TimedOut(Duration),
}

/// Whether a fraud verdict moves a new application straight to `fake`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FraudPolicy {
    #[default]
    AutoFlag,
    /// Fraud verdicts are stored as advice only; an administrator decides.
    AdvisoryOnly,
}

impl FraudPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "auto_flag" | "automatic" => Some(Self::AutoFlag),
            "advisory" | "manual" => Some(Self::AdvisoryOnly),
            _ => None,
        }
    }
}

/// What intake recorded from the screening call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningNote {
    pub outcome: ScreeningOutcome,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningOutcome {
    Genuine,
    Fake,
    Unavailable,
}

impl ScreeningNote {
    pub(crate) fn from_result(result: Result<Verdict, VerificationError>) -> Self {
        match result {
            Ok(Verdict::Genuine(details)) => Self {
                outcome: ScreeningOutcome::Genuine,
                details,
            },
            Ok(Verdict::Fraud(details)) => Self {
                outcome: ScreeningOutcome::Fake,
                details,
            },
            Err(err) => Self {
                outcome: ScreeningOutcome::Unavailable,
                details: format!("verification unavailable: {err}"),
            },
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.outcome == ScreeningOutcome::Fake
    }
}

/// Calls `adapter` and converts an overrun into [`VerificationError::TimedOut`].
pub(crate) async fn verify_within(
    adapter: &dyn VerificationAdapter,
    details: &ApplicationDetails,
    limit: Duration,
) -> Result<Verdict, VerificationError> {
    match tokio::time::timeout(limit, adapter.verify(details)).await {
        Ok(result) => result,
        Err(_) => Err(VerificationError::TimedOut(limit)),
    }
}
