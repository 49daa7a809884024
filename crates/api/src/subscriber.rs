//! In-process subscriber for the `change_batch_quantity` topic.

use std::sync::Arc;

use common::BatchRef;
use domain::ChangeBatchQuantity;
use serde::Deserialize;
use service::{CommandOutput, MessageBus};
use storage::ProductStorage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Topic external systems publish batch quantity changes on.
pub const CHANGE_BATCH_QUANTITY_TOPIC: &str = "change_batch_quantity";

#[derive(Debug, Deserialize)]
struct ChangeBatchQuantityPayload {
    batchref: BatchRef,
    qty: u32,
}

/// Translates one topic payload into `ChangeBatchQuantity` and dispatches it.
pub async fn handle_change_batch_quantity<S: ProductStorage>(
    bus: &MessageBus<S>,
    payload: serde_json::Value,
) -> service::Result<Vec<CommandOutput>> {
    tracing::debug!(%payload, "Handling change_batch_quantity message");
    let data: ChangeBatchQuantityPayload = serde_json::from_value(payload)?;

    let mut uow = bus.unit_of_work();
    bus.handle(ChangeBatchQuantity::new(data.batchref, data.qty), &mut uow)
        .await
}

/// Consumes the topic until every sender is dropped.
///
/// Failures are logged and the message skipped.
pub fn spawn<S: ProductStorage>(
    bus: Arc<MessageBus<S>>,
    mut receiver: mpsc::Receiver<serde_json::Value>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(topic = CHANGE_BATCH_QUANTITY_TOPIC, "Subscriber starting");

        while let Some(payload) = receiver.recv().await {
            let outcome = match handle_change_batch_quantity(&bus, payload).await {
                Ok(_) => "handled",
                Err(error) => {
                    tracing::error!(
                        topic = CHANGE_BATCH_QUANTITY_TOPIC,
                        %error,
                        "Failed to handle message, skipping"
                    );
                    "skipped"
                }
            };
            metrics::counter!(
                "subscriber_messages_total",
                "topic" => CHANGE_BATCH_QUANTITY_TOPIC,
                "outcome" => outcome
            )
            .increment(1);
        }

        tracing::info!(topic = CHANGE_BATCH_QUANTITY_TOPIC, "Subscriber stopped");
    })
}
