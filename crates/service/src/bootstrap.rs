//! Composition root for the message bus.

use std::sync::Arc;

use domain::{CommandKind, EventKind};
use projections::AllocationsView;
use storage::ProductStorage;

use crate::Result;
use crate::handlers::{
    AddBatchHandler, AllocateHandler, AllocatedPublisher, ChangeBatchQuantityHandler,
    OutOfStockNotifier, ProjectionHandler, ReallocateHandler,
};
use crate::messagebus::MessageBus;
use crate::notifications::{LogNotifications, Notifications};
use crate::publisher::{BroadcastPublisher, EventPublisher};
use crate::registry::{CommandHandlers, EventHandlers};
use crate::retry::RetryPolicy;

/// Address out-of-stock notifications go to unless configured otherwise.
pub const DEFAULT_NOTIFY_ADDRESS: &str = "stock@made.com";

/// External collaborators the handlers depend on.
#[derive(Clone)]
pub struct Dependencies {
    pub notifications: Arc<dyn Notifications>,
    pub publisher: Arc<dyn EventPublisher>,
    pub allocations: AllocationsView,
    pub notify_address: String,
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            notifications: Arc::new(LogNotifications),
            publisher: Arc::new(BroadcastPublisher::default()),
            allocations: AllocationsView::new(),
            notify_address: DEFAULT_NOTIFY_ADDRESS.to_string(),
        }
    }
}

/// Builds a message bus with every handler registered.
pub fn bootstrap<S: ProductStorage>(
    storage: S,
    dependencies: Dependencies,
    retry: RetryPolicy,
) -> Result<MessageBus<S>> {
    let mut commands = CommandHandlers::new();
    commands.register(CommandKind::CreateBatch, AddBatchHandler)?;
    commands.register(CommandKind::Allocate, AllocateHandler)?;
    commands.register(CommandKind::ChangeBatchQuantity, ChangeBatchQuantityHandler)?;

    let projection = Arc::new(dependencies.allocations);

    let mut events = EventHandlers::new();
    events.subscribe(
        EventKind::OutOfStock,
        OutOfStockNotifier::new(dependencies.notifications, dependencies.notify_address),
    );
    events.subscribe(
        EventKind::Allocated,
        AllocatedPublisher::new(dependencies.publisher),
    );
    events.subscribe(
        EventKind::Allocated,
        ProjectionHandler::new(projection.clone()),
    );
    events.subscribe(EventKind::Deallocated, ProjectionHandler::new(projection));
    events.subscribe(EventKind::AllocationRequired, ReallocateHandler);

    tracing::info!(max_attempts = retry.max_attempts, "Message bus ready");
    MessageBus::new(storage, commands, events, retry)
}
