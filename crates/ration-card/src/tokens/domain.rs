use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::UserId;

/// Hard upper bound on recipients per batch.
pub const MAX_BATCH_SIZE: usize = 50;

/// Administrator request to notify a set of users of a collection slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub user_ids: Vec<UserId>,
    pub message: String,
    pub time_slot: String,
}

/// Batch rejected before any message was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistributionError {
    #[error("select at least one recipient")]
    EmptyBatch,
    #[error("a batch may target at most {max} users (found {found})")]
    TooManyRecipients { max: usize, found: usize },
    #[error("message is required")]
    MissingMessage,
    #[error("time slot is required")]
    MissingTimeSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why one recipient did not receive the notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    #[error("user not found")]
    UnknownRecipient,
    #[error("user has no phone number on file")]
    NoContact,
    #[error("user directory unavailable: {0}")]
    Directory(String),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("transport timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Audit entry written for every dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub batch_id: BatchId,
    pub user_id: UserId,
    pub dispatched_at: DateTime<Utc>,
    pub message: String,
    pub time_slot: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientFailure {
    pub user_id: UserId,
    pub error: String,
}

/// Aggregated outcome returned to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSummary {
    pub batch_id: BatchId,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_ids: Vec<UserId>,
    pub failures: Vec<RecipientFailure>,
}

/// Request that passed validation, with duplicate recipients collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedBatch {
    pub(crate) recipients: Vec<UserId>,
    pub(crate) message: String,
    pub(crate) time_slot: String,
}

impl ValidatedBatch {
    pub(crate) fn from_request(request: DistributionRequest) -> Result<Self, DistributionError> {
        let DistributionRequest {
            user_ids,
            message,
            time_slot,
        } = request;

        if user_ids.is_empty() {
            return Err(DistributionError::EmptyBatch);
        }
        if user_ids.len() > MAX_BATCH_SIZE {
            return Err(DistributionError::TooManyRecipients {
                max: MAX_BATCH_SIZE,
                found: user_ids.len(),
            });
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(DistributionError::MissingMessage);
        }
        let time_slot = time_slot.trim();
        if time_slot.is_empty() {
            return Err(DistributionError::MissingTimeSlot);
        }

        let mut recipients: Vec<UserId> = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if !recipients.contains(&user_id) {
                recipients.push(user_id);
            }
        }

        Ok(Self {
            recipients,
            message: message.to_string(),
            time_slot: time_slot.to_string(),
        })
    }

    /// SMS body handed to the transport.
    pub(crate) fn body(&self) -> String {
        format!("{}\nTime Slot: {}", self.message, self.time_slot)
    }
}
