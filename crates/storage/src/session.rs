use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;

use crate::Result;

/// A product store that hands out transactional sessions.
///
/// Implementations are cheap to clone; each clone refers to the same
/// underlying storage.
#[async_trait]
pub trait ProductStorage: Clone + Send + Sync + 'static {
    /// Session type produced by [`ProductStorage::open`].
    type Session: StorageSession;

    /// Opens a new session (transaction).
    async fn open(&self) -> Result<Self::Session>;
}

/// One transaction against a product store.
///
/// Writes made through [`StorageSession::save`] become visible to other
/// sessions only after [`StorageSession::commit`]. Dropping a session
/// without committing discards them.
#[async_trait]
pub trait StorageSession: Send + Sized {
    /// Loads a product by sku.
    ///
    /// Returns `None` if no product with that sku exists.
    async fn load(&mut self, sku: &Sku) -> Result<Option<Product>>;

    /// Finds the sku of the product owning a batch.
    async fn sku_for_batch(&mut self, batchref: &BatchRef) -> Result<Option<Sku>>;

    /// Loads every stored product, ordered by sku.
    async fn load_all(&mut self) -> Result<Vec<Product>>;

    /// Stages a product's current state for writing.
    ///
    /// Fails with `ConcurrencyConflict` if the product changed since this
    /// session loaded it, or `DuplicateProduct` if it was never loaded but
    /// already exists.
    async fn save(&mut self, product: &Product) -> Result<()>;

    /// Makes all staged writes durable and visible atomically.
    async fn commit(self) -> Result<()>;
}
