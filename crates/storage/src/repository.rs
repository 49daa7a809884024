//! Seen-tracking product repository.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use common::{BatchRef, Sku};
use domain::Product;

use crate::{Result, StorageSession, StoreError};

/// Repository over one storage session.
///
/// Every product added or returned is kept in the `seen` map, keyed by sku,
/// so a scope works on a single instance per product and the caller can
/// drain the messages those instances raised once the scope ends. The map
/// is borrowed from the owner of the scope.
pub struct Repository<'a, S: StorageSession> {
    session: S,
    seen: &'a mut HashMap<Sku, Product>,
}

impl<'a, S: StorageSession> Repository<'a, S> {
    pub fn new(session: S, seen: &'a mut HashMap<Sku, Product>) -> Self {
        Self { session, seen }
    }

    /// Starts tracking a new product. It is written on commit.
    pub fn add(&mut self, product: Product) -> Result<&mut Product> {
        match self.seen.entry(product.sku().clone()) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateProduct(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(product)),
        }
    }

    /// Returns the product for a sku, loading it on first access.
    pub async fn get(&mut self, sku: &Sku) -> Result<Option<&mut Product>> {
        if !self.seen.contains_key(sku) {
            match self.session.load(sku).await? {
                Some(product) => {
                    self.seen.insert(sku.clone(), product);
                }
                None => return Ok(None),
            }
        }

        Ok(self.seen.get_mut(sku))
    }

    /// Returns the product owning a batch.
    pub async fn get_by_batchref(&mut self, batchref: &BatchRef) -> Result<Option<&mut Product>> {
        let tracked = self
            .seen
            .values()
            .find(|product| product.batch(batchref).is_some())
            .map(|product| product.sku().clone());

        let sku = match tracked {
            Some(sku) => sku,
            None => match self.session.sku_for_batch(batchref).await? {
                Some(sku) => sku,
                None => return Ok(None),
            },
        };

        self.get(&sku).await
    }

    /// Returns the product for a sku, creating an empty one if none exists.
    pub async fn get_or_add(&mut self, sku: &Sku) -> Result<&mut Product> {
        if self.get(sku).await?.is_none() {
            self.seen.insert(sku.clone(), Product::new(sku.clone()));
        }

        self.seen
            .get_mut(sku)
            .ok_or_else(|| StoreError::DuplicateProduct(sku.clone()))
    }

    /// Returns every product, ordered by sku.
    pub async fn list(&mut self) -> Result<Vec<&Product>> {
        for product in self.session.load_all().await? {
            self.seen
                .entry(product.sku().clone())
                .or_insert(product);
        }

        let mut products: Vec<&Product> = self.seen.values().collect();
        products.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(products)
    }

    /// Products tracked so far.
    pub fn seen(&self) -> impl Iterator<Item = &Product> {
        self.seen.values()
    }

    /// Saves every tracked product and commits the session.
    pub async fn commit(mut self) -> Result<()> {
        let mut skus: Vec<Sku> = self.seen.keys().cloned().collect();
        skus.sort();

        for sku in &skus {
            if let Some(product) = self.seen.get(sku) {
                self.session.save(product).await?;
            }
        }

        tracing::debug!(products = skus.len(), "Committing storage session");
        self.session.commit().await
    }
}
