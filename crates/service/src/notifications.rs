//! Outbound notifications.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Result, ServiceError};

/// Sends a human-readable message to a destination address.
#[async_trait]
pub trait Notifications: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifications;

#[async_trait]
impl Notifications for LogNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        tracing::info!(destination, message, "Notification sent");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotificationsState {
    sent: HashMap<String, Vec<String>>,
    failures_remaining: usize,
}

/// In-memory notifications for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifications {
    state: Arc<Mutex<InMemoryNotificationsState>>,
}

impl InMemoryNotifications {
    /// Creates a new in-memory notifications sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the next `count` sends to fail.
    pub async fn fail_next(&self, count: usize) {
        self.state.lock().await.failures_remaining = count;
    }

    /// Returns the messages delivered to a destination, oldest first.
    pub async fn sent(&self, destination: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .sent
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifications for InMemoryNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(ServiceError::Notification(format!(
                "could not deliver to {destination}"
            )));
        }

        state
            .sent
            .entry(destination.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }
}
