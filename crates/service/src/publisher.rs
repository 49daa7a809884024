//! Outbound event publication.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::Result;

/// A message published on a named channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedMessage {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Publishes JSON payloads to external consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()>;
}

/// Publisher backed by a tokio broadcast channel.
///
/// Publishing with no subscribers drops the message.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<PublishedMessage>,
}

impl BroadcastPublisher {
    /// Creates a publisher buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        let message = PublishedMessage {
            channel: channel.to_string(),
            payload,
        };

        match self.sender.send(message) {
            Ok(receivers) => tracing::debug!(channel, receivers, "Message published"),
            Err(_) => tracing::debug!(channel, "No subscribers, message dropped"),
        }
        Ok(())
    }
}
