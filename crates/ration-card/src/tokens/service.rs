use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use super::domain::{
    BatchId, DeliveryFailure, DeliveryOutcome, DeliveryRecord, DistributionError,
    DistributionRequest, DistributionSummary, RecipientFailure, ValidatedBatch,
};
use super::ledger::{DeliveryLedger, LedgerError};
use super::transport::MessageTransport;
use crate::config::DistributionConfig;
use crate::users::{UserDirectory, UserId};

/// Sends collection-slot notifications to administrator-selected users.
///
/// Recipients are not filtered by card status.
pub struct TokenDistributionService {
    users: Arc<dyn UserDirectory>,
    transport: Arc<dyn MessageTransport>,
    ledger: Arc<dyn DeliveryLedger>,
    config: DistributionConfig,
}

impl TokenDistributionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        transport: Arc<dyn MessageTransport>,
        ledger: Arc<dyn DeliveryLedger>,
        config: DistributionConfig,
    ) -> Self {
        Self {
            users,
            transport,
            ledger,
            config,
        }
    }

    /// Validate the batch, then dispatch one message per distinct recipient.
    ///
    /// Malformed batches fail before any send. Once dispatch starts, each
    /// recipient succeeds or fails on its own and the summary reports both.
    pub async fn distribute(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionSummary, DistributionError> {
        let batch = ValidatedBatch::from_request(request)?;
        let batch_id = BatchId::generate();
        let dispatched_at = Utc::now();
        let body = batch.body();

        let mut outcomes: Vec<(usize, UserId, Result<(), DeliveryFailure>)> =
            stream::iter(batch.recipients.iter().cloned().enumerate())
                .map(|(position, user_id)| {
                    let body = body.as_str();
                    async move {
                        let result = self.deliver(&user_id, body).await;
                        (position, user_id, result)
                    }
                })
                .buffer_unordered(self.config.parallelism)
                .collect()
                .await;
        outcomes.sort_by_key(|(position, _, _)| *position);

        let attempted = outcomes.len();
        let mut failures = Vec::new();
        for (_, user_id, result) in outcomes {
            let outcome = match result {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(failure) => {
                    warn!(%batch_id, %user_id, error = %failure, "token delivery failed");
                    failures.push(RecipientFailure {
                        user_id: user_id.clone(),
                        error: failure.to_string(),
                    });
                    DeliveryOutcome::Failed {
                        reason: failure.to_string(),
                    }
                }
            };

            let entry = DeliveryRecord {
                batch_id: batch_id.clone(),
                user_id,
                dispatched_at,
                message: batch.message.clone(),
                time_slot: batch.time_slot.clone(),
                outcome,
            };
            if let Err(err) = self.ledger.record(entry) {
                warn!(%batch_id, error = %err, "delivery record not persisted");
            }
        }

        let summary = DistributionSummary {
            batch_id,
            attempted,
            succeeded: attempted - failures.len(),
            failed: failures.len(),
            failed_ids: failures.iter().map(|failure| failure.user_id.clone()).collect(),
            failures,
        };

        info!(
            batch_id = %summary.batch_id,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            time_slot = %batch.time_slot,
            "token distribution finished"
        );
        Ok(summary)
    }

    pub fn deliveries(&self) -> Result<Vec<DeliveryRecord>, LedgerError> {
        self.ledger.entries()
    }

    async fn deliver(&self, user_id: &UserId, body: &str) -> Result<(), DeliveryFailure> {
        let user = self
            .users
            .find(user_id)
            .map_err(|err| DeliveryFailure::Directory(err.to_string()))?
            .ok_or(DeliveryFailure::UnknownRecipient)?;
        let phone = user.contact_number().ok_or(DeliveryFailure::NoContact)?;

        let limit = self.config.send_timeout;
        match tokio::time::timeout(limit, self.transport.send(phone, body)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(DeliveryFailure::Transport(err.to_string())),
            Err(_) => Err(DeliveryFailure::TimedOut(limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::ledger::InMemoryDeliveryLedger;
    use crate::tokens::transport::TransportError;
    use crate::tokens::MAX_BATCH_SIZE;
    use crate::users::{InMemoryUserDirectory, Role, User};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTransport {
        failing: HashSet<String>,
        stalled: HashSet<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingTransport {
        fn failing_for(phones: &[&str]) -> Self {
            Self {
                failing: phones.iter().map(|phone| phone.to_string()).collect(),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().expect("transport mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
            if self.stalled.contains(phone) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(phone) {
                return Err(TransportError::Rejected("carrier refused".to_string()));
            }
            self.sent
                .lock()
                .expect("transport mutex poisoned")
                .push((phone.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn citizen(id: &str, phone: &str) -> User {
        User {
            id: UserId::new(id),
            name: format!("Citizen {id}"),
            email: format!("{id}@example.org"),
            phone: phone.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn phone_for(index: usize) -> String {
        format!("+9190000{index:05}")
    }

    fn directory(count: usize) -> Arc<InMemoryUserDirectory> {
        Arc::new(InMemoryUserDirectory::with_users(
            (1..=count).map(|index| citizen(&format!("u{index}"), &phone_for(index))),
        ))
    }

    fn service(
        users: Arc<InMemoryUserDirectory>,
        transport: Arc<RecordingTransport>,
    ) -> (TokenDistributionService, Arc<InMemoryDeliveryLedger>) {
        let ledger = Arc::new(InMemoryDeliveryLedger::default());
        let service = TokenDistributionService::new(
            users,
            transport,
            ledger.clone(),
            DistributionConfig::new(8, Duration::from_millis(200)),
        );
        (service, ledger)
    }

    fn request(ids: impl IntoIterator<Item = String>) -> DistributionRequest {
        DistributionRequest {
            user_ids: ids.into_iter().map(UserId).collect(),
            message: "Collect ration".to_string(),
            time_slot: "10-12".to_string(),
        }
    }

    #[tokio::test]
    async fn partial_failure_is_reported_not_raised() {
        let transport = Arc::new(RecordingTransport::failing_for(&[&phone_for(2)]));
        let (service, ledger) = service(directory(2), transport.clone());

        let summary = service
            .distribute(request(["u1".to_string(), "u2".to_string()]))
            .await
            .expect("batch completes");

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_ids, vec![UserId::new("u2")]);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "Collect ration\nTime Slot: 10-12");

        let records = ledger.for_batch(&summary.batch_id).expect("ledger readable");
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|record| record.user_id.as_str() == "u1" && record.outcome.is_delivered()));
    }

    #[tokio::test]
    async fn batch_size_boundaries_are_enforced() {
        let transport = Arc::new(RecordingTransport::default());
        let (service, _) = service(directory(MAX_BATCH_SIZE + 1), transport.clone());

        let empty = service.distribute(request(Vec::new())).await;
        assert_eq!(empty, Err(DistributionError::EmptyBatch));

        let oversized = service
            .distribute(request((1..=MAX_BATCH_SIZE + 1).map(|i| format!("u{i}"))))
            .await;
        assert_eq!(
            oversized,
            Err(DistributionError::TooManyRecipients {
                max: MAX_BATCH_SIZE,
                found: MAX_BATCH_SIZE + 1
            })
        );
        assert!(transport.sent().is_empty(), "rejected batches send nothing");

        let full = service
            .distribute(request((1..=MAX_BATCH_SIZE).map(|i| format!("u{i}"))))
            .await
            .expect("fifty recipients accepted");
        assert_eq!(full.attempted, MAX_BATCH_SIZE);
        assert_eq!(full.succeeded, MAX_BATCH_SIZE);
    }

    #[tokio::test]
    async fn blank_message_or_slot_is_rejected() {
        let (service, _) = service(directory(1), Arc::new(RecordingTransport::default()));

        let mut blank_message = request(["u1".to_string()]);
        blank_message.message = "   ".to_string();
        assert_eq!(
            service.distribute(blank_message).await,
            Err(DistributionError::MissingMessage)
        );

        let mut blank_slot = request(["u1".to_string()]);
        blank_slot.time_slot = String::new();
        assert_eq!(
            service.distribute(blank_slot).await,
            Err(DistributionError::MissingTimeSlot)
        );
    }

    #[tokio::test]
    async fn unknown_and_unreachable_users_fail_individually() {
        let users = directory(1);
        users
            .upsert(citizen("silent", ""))
            .expect("directory writable");
        let (service, _) = service(users, Arc::new(RecordingTransport::default()));

        let summary = service
            .distribute(request([
                "u1".to_string(),
                "ghost".to_string(),
                "silent".to_string(),
                "u1".to_string(),
            ]))
            .await
            .expect("batch completes");

        assert_eq!(summary.attempted, 3, "duplicates collapse");
        assert_eq!(summary.succeeded, 1);
        assert_eq!(
            summary.failed_ids,
            vec![UserId::new("ghost"), UserId::new("silent")]
        );
        assert!(summary.failures[0].error.contains("not found"));
        assert!(summary.failures[1].error.contains("phone"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_sends_time_out() {
        let mut transport = RecordingTransport::default();
        transport.stalled.insert(phone_for(1));
        let (service, _) = service(directory(2), Arc::new(transport));

        let summary = service
            .distribute(request(["u1".to_string(), "u2".to_string()]))
            .await
            .expect("batch completes");

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed_ids, vec![UserId::new("u1")]);
        assert!(summary.failures[0].error.contains("timed out"));
    }
}
