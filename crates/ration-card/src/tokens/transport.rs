use async_trait::async_trait;

/// Outbound SMS port. Implementations own provider credentials and retries.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("message rejected by provider: {0}")]
    Rejected(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}
