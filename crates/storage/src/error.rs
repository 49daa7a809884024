use common::{BatchRef, Sku, Version};
use thiserror::Error;

/// Errors that can occur when loading or saving products.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer changed the product since this session read it.
    #[error(
        "Concurrency conflict for product {sku}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        sku: Sku,
        expected: Version,
        actual: Version,
    },

    /// A product with this sku already exists.
    #[error("Product already exists: {0}")]
    DuplicateProduct(Sku),

    /// The batch reference is already used by another product.
    #[error("Batch reference already exists: {0}")]
    DuplicateBatch(BatchRef),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
