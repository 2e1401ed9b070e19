pub mod memory;
pub mod mqtt;

use async_trait::async_trait;

/// Sink for decoded location fixes.
///
/// One serialized fix per call; delivery semantics (retries, queueing) are
/// the implementation's business.
#[async_trait]
pub trait LocationPublisher: Send + Sync + 'static {
    /// Error type specific to this publisher implementation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver one payload to `topic`.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;
}
