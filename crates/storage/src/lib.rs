//! Product persistence.
//!
//! [`ProductStorage`] hands out [`StorageSession`]s, one per transaction.
//! [`Repository`] wraps a session and tracks every product it returns so the
//! unit of work can save them on commit and collect the messages they raised.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod session;

pub use common::{BatchRef, Sku, Version};
pub use error::{Result, StoreError};
pub use memory::{InMemorySession, InMemoryStorage};
pub use postgres::{PostgresSession, PostgresStorage};
pub use repository::Repository;
pub use session::{ProductStorage, StorageSession};
