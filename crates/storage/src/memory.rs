use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchRef, Sku, Version};
use domain::Product;
use tokio::sync::RwLock;

use crate::{ProductStorage, Result, StorageSession, StoreError};

/// A stored product and the revision it was written at.
#[derive(Debug, Clone)]
struct Stored {
    revision: Version,
    product: Product,
}

#[derive(Debug, Default)]
struct State {
    products: HashMap<Sku, Stored>,
    commits: usize,
}

/// In-memory product storage for tests and local runs.
///
/// Sessions stage their writes and apply them atomically on commit. Every
/// commit bumps the revision of the products it writes, and a session whose
/// loaded revision is stale fails with `ConcurrencyConflict`.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successful commits.
    pub async fn commit_count(&self) -> usize {
        self.state.read().await.commits
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }
}

#[async_trait]
impl ProductStorage for InMemoryStorage {
    type Session = InMemorySession;

    async fn open(&self) -> Result<InMemorySession> {
        Ok(InMemorySession {
            state: Arc::clone(&self.state),
            loaded: HashMap::new(),
            staged: HashMap::new(),
            committed: false,
        })
    }
}

/// Session over [`InMemoryStorage`].
pub struct InMemorySession {
    state: Arc<RwLock<State>>,
    loaded: HashMap<Sku, Version>,
    staged: HashMap<Sku, Product>,
    committed: bool,
}

fn snapshot(product: &Product) -> Product {
    Product::from_parts(
        product.sku().clone(),
        product.batches().to_vec(),
        product.version_number(),
    )
}

#[async_trait]
impl StorageSession for InMemorySession {
    async fn load(&mut self, sku: &Sku) -> Result<Option<Product>> {
        let state = self.state.read().await;
        let Some(stored) = state.products.get(sku) else {
            return Ok(None);
        };

        self.loaded.insert(sku.clone(), stored.revision);
        Ok(Some(snapshot(&stored.product)))
    }

    async fn sku_for_batch(&mut self, batchref: &BatchRef) -> Result<Option<Sku>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .find(|stored| stored.product.batch(batchref).is_some())
            .map(|stored| stored.product.sku().clone()))
    }

    async fn load_all(&mut self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .map(|stored| {
                self.loaded
                    .insert(stored.product.sku().clone(), stored.revision);
                snapshot(&stored.product)
            })
            .collect();
        products.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(products)
    }

    async fn save(&mut self, product: &Product) -> Result<()> {
        self.staged.insert(product.sku().clone(), snapshot(product));
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        let mut state = self.state.write().await;

        for (sku, product) in &self.staged {
            let current = state.products.get(sku);
            match (self.loaded.get(sku), current) {
                (Some(expected), Some(stored)) if *expected != stored.revision => {
                    return Err(StoreError::ConcurrencyConflict {
                        sku: sku.clone(),
                        expected: *expected,
                        actual: stored.revision,
                    });
                }
                (None, Some(_)) => return Err(StoreError::DuplicateProduct(sku.clone())),
                _ => {}
            }

            let taken = product.batches().iter().find_map(|batch| {
                state
                    .products
                    .values()
                    .filter(|stored| stored.product.sku() != sku)
                    .find(|stored| stored.product.batch(batch.reference()).is_some())
                    .map(|_| batch.reference().clone())
            });
            if let Some(batchref) = taken {
                return Err(StoreError::DuplicateBatch(batchref));
            }
        }

        for (sku, product) in self.staged.drain() {
            let revision = state
                .products
                .get(&sku)
                .map(|stored| stored.revision.next())
                .unwrap_or_else(|| Version::initial().next());
            state.products.insert(sku, Stored { revision, product });
        }
        state.commits += 1;
        self.committed = true;

        Ok(())
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            tracing::debug!(
                products = self.staged.len(),
                "Rolling back uncommitted session"
            );
        }
    }
}
