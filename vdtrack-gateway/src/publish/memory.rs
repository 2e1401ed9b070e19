use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::LocationPublisher;

/// Captures published messages in memory.
///
/// Reference implementation of the publisher trait; the integration tests
/// use it to assert on what would have gone to the broker.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all captured messages, leaving the buffer empty.
    pub async fn take_messages(&self) -> Vec<PublishedMessage> {
        let mut messages = self.messages.lock().await;
        std::mem::take(&mut *messages)
    }
}

#[async_trait]
impl LocationPublisher for InMemoryPublisher {
    type Error = Infallible;

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        let mut messages = self.messages.lock().await;
        messages.push(PublishedMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });

        Ok(())
    }
}
