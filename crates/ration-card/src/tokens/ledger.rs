use std::sync::Mutex;

use super::domain::{BatchId, DeliveryRecord};

/// Append-only audit log of dispatch attempts.
pub trait DeliveryLedger: Send + Sync {
    fn record(&self, entry: DeliveryRecord) -> Result<(), LedgerError>;
    fn entries(&self) -> Result<Vec<DeliveryRecord>, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("delivery ledger unavailable: {0}")]
    Unavailable(String),
}

/// Process-local ledger for development and tests.
///
/// Entries are kept for the life of the process and `entries()` copies the
/// whole log, so deployments that distribute regularly should back the
/// [`DeliveryLedger`] port with durable storage instead.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryLedger {
    entries: Mutex<Vec<DeliveryRecord>>,
}

impl InMemoryDeliveryLedger {
    pub fn for_batch(&self, batch_id: &BatchId) -> Result<Vec<DeliveryRecord>, LedgerError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| &entry.batch_id == batch_id)
            .collect())
    }
}

impl DeliveryLedger for InMemoryDeliveryLedger {
    fn record(&self, entry: DeliveryRecord) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))?
            .push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<DeliveryRecord>, LedgerError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))?;
        Ok(guard.clone())
    }
}
