//! Service error types.

use common::{BatchRef, Sku};
use domain::{CommandKind, ProductError};
use storage::StoreError;
use thiserror::Error;

/// Errors that can occur while handling commands and events.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No product exists for the sku.
    #[error("Invalid sku {0}")]
    InvalidSku(Sku),

    /// No batch exists with the reference.
    #[error("Unknown batch {0}")]
    UnknownBatch(BatchRef),

    /// Domain rule violated.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// No handler registered for a command kind.
    #[error("No handler registered for command {0}")]
    NoHandler(CommandKind),

    /// A command kind already has a handler.
    #[error("Handler already registered for command {0}")]
    DuplicateHandler(CommandKind),

    /// A handler received a message it does not handle.
    #[error("Handler {handler} cannot handle {message}")]
    Misrouted {
        handler: &'static str,
        message: &'static str,
    },

    /// Notification could not be delivered.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
