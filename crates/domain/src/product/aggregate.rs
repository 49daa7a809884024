//! Product aggregate implementation.

use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use common::{BatchRef, Sku, Version};

use crate::aggregate::Aggregate;
use crate::message::Message;

use super::{
    AllocationRequired, Batch, OrderLine, ProductError,
    events::{Allocated, Deallocated, OutOfStock},
};

/// Product aggregate root.
///
/// Owns every batch of one sku and is the consistency boundary for
/// allocation: all stock decisions for a sku go through it. Operations
/// append the messages they raise to an internal buffer which the unit of
/// work drains after the handler returns.
#[derive(Debug, Clone)]
pub struct Product {
    /// Stock keeping unit shared by every batch.
    sku: Sku,

    /// Batches in insertion order.
    batches: Vec<Batch>,

    /// Bumped once per successful allocation.
    version_number: Version,

    /// Messages raised and not yet collected. Never persisted.
    messages: VecDeque<Message>,
}

impl Aggregate for Product {
    type Id = Sku;

    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> &Sku {
        &self.sku
    }

    fn version(&self) -> Version {
        self.version_number
    }

    fn pending_messages(&self) -> usize {
        self.messages.len()
    }

    fn take_messages(&mut self) -> Drain<'_, Message> {
        self.messages.drain(..)
    }
}

impl Product {
    /// Creates a product with no batches at the initial version.
    pub fn new(sku: impl Into<Sku>) -> Self {
        Self::from_parts(sku.into(), Vec::new(), Version::initial())
    }

    /// Rebuilds a product from stored state. The message buffer starts empty.
    pub fn from_parts(sku: Sku, batches: Vec<Batch>, version_number: Version) -> Self {
        Self {
            sku,
            batches,
            version_number,
            messages: VecDeque::new(),
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn version_number(&self) -> Version {
        self.version_number
    }

    /// Returns all batches in insertion order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns a batch by reference.
    pub fn batch(&self, reference: &BatchRef) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Messages waiting to be collected, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Appends a message to the buffer.
    pub fn record(&mut self, message: impl Into<Message>) {
        self.messages.push_back(message.into());
    }

    /// Adds a batch of this product's sku.
    pub fn add_batch(&mut self, batch: Batch) -> Result<(), ProductError> {
        if batch.sku() != &self.sku {
            return Err(ProductError::SkuMismatch {
                expected: self.sku.clone(),
                actual: batch.sku().clone(),
            });
        }

        if self.batch(batch.reference()).is_some() {
            return Err(ProductError::DuplicateBatch {
                batchref: batch.reference().clone(),
            });
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Allocates the line to the preferred batch that can take it.
    ///
    /// In-stock batches come first, then batches by earliest eta; ties keep
    /// insertion order. Returns the chosen reference, or `None` after
    /// recording `OutOfStock` when no batch fits.
    #[tracing::instrument(skip(self, line), fields(sku = %self.sku, orderid = %line.orderid()))]
    pub fn allocate(&mut self, line: OrderLine) -> Option<BatchRef> {
        let mut preference: Vec<usize> = (0..self.batches.len()).collect();
        preference.sort_by_key(|&i| self.batches[i].eta());

        let chosen = preference
            .into_iter()
            .find(|&i| self.batches[i].can_allocate(&line));

        let Some(index) = chosen else {
            tracing::info!("No batch can take the line");
            metrics::counter!("out_of_stock_total").increment(1);
            self.record(OutOfStock {
                sku: line.sku().clone(),
            });
            return None;
        };

        let batch = &mut self.batches[index];
        let batchref = batch.reference().clone();
        let allocated = Allocated {
            orderid: line.orderid().clone(),
            sku: line.sku().clone(),
            batchref: batchref.clone(),
            qty: line.qty(),
        };
        batch.allocate(line);

        self.version_number = self.version_number.next();
        metrics::counter!("allocations_total").increment(1);
        tracing::debug!(batchref = %batchref, version = %self.version_number, "Line allocated");
        self.record(allocated);

        Some(batchref)
    }

    /// Sets a batch's purchased quantity, shedding lines until it fits.
    ///
    /// Each shed line raises `Deallocated` followed by `AllocationRequired`.
    pub fn change_batch_quantity(
        &mut self,
        reference: &BatchRef,
        qty: u32,
    ) -> Result<(), ProductError> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference() == reference)
            .ok_or_else(|| ProductError::BatchNotFound {
                batchref: reference.clone(),
            })?;

        batch.set_purchased_quantity(qty);

        let mut shed = Vec::new();
        while batch.available_quantity() < 0 {
            match batch.deallocate_one() {
                Some(line) => shed.push(line),
                None => break,
            }
        }

        for line in shed {
            self.record(Deallocated {
                orderid: line.orderid().clone(),
                sku: line.sku().clone(),
                qty: line.qty(),
            });
            self.record(AllocationRequired {
                orderid: line.orderid().clone(),
                sku: line.sku().clone(),
                qty: line.qty(),
            });
        }

        Ok(())
    }
}
