//! Unit of work: one repository, one commit boundary, and message collection.

use std::collections::{HashMap, VecDeque};

use common::Sku;
use domain::{Aggregate, Message, Product};
use storage::{ProductStorage, Repository};

use crate::Result;

/// Pairs a product storage with the products seen in the current scope.
///
/// A handler opens a scope with [`UnitOfWork::begin`], works through
/// `scope.products`, and commits. Leaving the scope any other way rolls
/// back. After the handler returns, [`UnitOfWork::collect_new_events`]
/// drains the messages the touched products raised.
pub struct UnitOfWork<S: ProductStorage> {
    storage: S,
    seen: HashMap<Sku, Product>,
    carried: VecDeque<Message>,
}

impl<S: ProductStorage> UnitOfWork<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            seen: HashMap::new(),
            carried: VecDeque::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Opens a transactional scope.
    ///
    /// Messages still buffered on products from an earlier scope are kept
    /// for collection; the products themselves are forgotten so the new
    /// scope reads fresh state.
    pub async fn begin(&mut self) -> Result<UnitOfWorkScope<'_, S>> {
        for product in self.seen.values_mut() {
            self.carried.extend(product.take_messages());
        }
        self.seen.clear();

        let session = self.storage.open().await?;
        Ok(UnitOfWorkScope {
            products: Repository::new(session, &mut self.seen),
        })
    }

    /// Drains the messages raised by products seen so far, oldest first.
    ///
    /// Each message is yielded once; the iterator must be consumed fully.
    pub fn collect_new_events(&mut self) -> impl Iterator<Item = Message> + '_ {
        let carried = self.carried.drain(..);
        let raised = self
            .seen
            .values_mut()
            .flat_map(|product| product.take_messages());
        carried.chain(raised)
    }

    /// Forgets tracked products and any uncollected messages.
    pub fn discard_seen(&mut self) {
        self.seen.clear();
        self.carried.clear();
    }
}

/// An open unit-of-work scope. Dropping it without commit rolls back.
pub struct UnitOfWorkScope<'a, S: ProductStorage> {
    pub products: Repository<'a, S::Session>,
}

impl<S: ProductStorage> UnitOfWorkScope<'_, S> {
    /// Saves every product the scope touched and commits.
    pub async fn commit(self) -> Result<()> {
        self.products.commit().await?;
        Ok(())
    }

    /// Discards the scope's writes.
    pub fn rollback(self) {
        tracing::debug!("Rolling back unit of work");
    }
}
