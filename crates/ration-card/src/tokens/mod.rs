//! Bulk collection-token notifications with per-recipient delivery tracking.

pub mod domain;
pub mod ledger;
pub mod service;
pub mod transport;

pub use domain::{
    BatchId, DeliveryFailure, DeliveryOutcome, DeliveryRecord, DistributionError,
    DistributionRequest, DistributionSummary, RecipientFailure, MAX_BATCH_SIZE,
};
pub use ledger::{DeliveryLedger, InMemoryDeliveryLedger, LedgerError};
pub use service::TokenDistributionService;
pub use transport::{MessageTransport, TransportError};
