//! Handlers wired into the message bus by [`crate::bootstrap()`].

mod commands;
mod events;

pub use commands::{AddBatchHandler, AllocateHandler, ChangeBatchQuantityHandler};
pub use events::{
    AllocatedPublisher, LINE_ALLOCATED_CHANNEL, OutOfStockNotifier, ProjectionHandler,
    ReallocateHandler,
};
