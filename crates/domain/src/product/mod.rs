//! Product aggregate and related types.

mod aggregate;
mod batch;
mod commands;
mod events;
mod value_objects;

pub use aggregate::Product;
pub use batch::Batch;
pub use commands::*;
pub use events::{
    Allocated, AllocationRequired, Deallocated, Event, EventKind, OutOfStock,
};
pub use value_objects::OrderLine;

use common::{BatchRef, Sku};
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Invalid quantity.
    #[error("Invalid quantity: {qty} (must be greater than 0)")]
    InvalidQuantity { qty: u32 },

    /// Batch not found in product.
    #[error("Batch not found: {batchref}")]
    BatchNotFound { batchref: BatchRef },

    /// Batch belongs to another sku.
    #[error("Sku mismatch: product is {expected}, batch is {actual}")]
    SkuMismatch { expected: Sku, actual: Sku },

    /// Batch reference already present.
    #[error("Duplicate batch: {batchref}")]
    DuplicateBatch { batchref: BatchRef },
}
