//! Stock batch entity.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use common::{BatchRef, Sku};

use super::OrderLine;

/// A batch of stock for one sku, either in the warehouse or on its way.
///
/// A batch without an `eta` is in stock. Identity is the batch reference:
/// two batches with the same reference are the same batch whatever their
/// other fields hold.
#[derive(Debug, Clone)]
pub struct Batch {
    reference: BatchRef,
    sku: Sku,
    purchased_quantity: u32,
    eta: Option<NaiveDate>,
    allocations: HashSet<OrderLine>,
}

impl Batch {
    /// Creates a batch with no allocations.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        purchased_quantity: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            purchased_quantity,
            eta,
            allocations: HashSet::new(),
        }
    }

    /// Rebuilds a batch from stored state.
    pub fn from_parts(
        reference: BatchRef,
        sku: Sku,
        purchased_quantity: u32,
        eta: Option<NaiveDate>,
        allocations: impl IntoIterator<Item = OrderLine>,
    ) -> Self {
        Self {
            reference,
            sku,
            purchased_quantity,
            eta,
            allocations: allocations.into_iter().collect(),
        }
    }

    pub fn reference(&self) -> &BatchRef {
        &self.reference
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    pub fn purchased_quantity(&self) -> u32 {
        self.purchased_quantity
    }

    /// Returns the order lines currently allocated to this batch.
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> {
        self.allocations.iter()
    }

    /// Returns true if the line is allocated to this batch.
    pub fn is_allocated(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    pub fn allocated_quantity(&self) -> i64 {
        self.allocations.iter().map(|line| i64::from(line.qty())).sum()
    }

    /// Purchased minus allocated quantity.
    ///
    /// Negative right after the purchased quantity was reduced below what is
    /// allocated, until the product sheds enough lines.
    pub fn available_quantity(&self) -> i64 {
        i64::from(self.purchased_quantity) - self.allocated_quantity()
    }

    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        line.sku() == &self.sku && self.available_quantity() >= i64::from(line.qty())
    }

    /// Allocates the line if it fits. Allocating the same line twice is a no-op.
    pub fn allocate(&mut self, line: OrderLine) {
        if self.can_allocate(&line) {
            self.allocations.insert(line);
        }
    }

    /// Removes the line if it is allocated here; otherwise does nothing.
    pub fn deallocate(&mut self, line: &OrderLine) {
        self.allocations.remove(line);
    }

    /// Removes and returns one allocated line, or `None` if nothing is allocated.
    ///
    /// Which line is removed is unspecified.
    pub fn deallocate_one(&mut self) -> Option<OrderLine> {
        let line = self.allocations.iter().next().cloned()?;
        self.allocations.remove(&line);
        Some(line)
    }

    pub(crate) fn set_purchased_quantity(&mut self, qty: u32) {
        self.purchased_quantity = qty;
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl Hash for Batch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_and_line(sku: &str, batch_qty: u32, line_qty: u32) -> (Batch, OrderLine) {
        (
            Batch::new("batch-001", sku, batch_qty, None),
            OrderLine::new("order-123", sku, line_qty).unwrap(),
        )
    }

    #[test]
    fn allocating_reduces_available_quantity() {
        let (mut batch, line) = batch_and_line("SMALL-TABLE", 20, 2);
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
    }

    #[test]
    fn can_allocate_if_available_greater_than_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 20, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_if_available_smaller_than_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 2, 20);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn can_allocate_if_available_equal_to_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 2, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn quantity_boundary_one_less_one_more() {
        let (batch, _) = batch_and_line("CHAIR", 10, 1);
        let one_less = OrderLine::new("o1", "CHAIR", 9).unwrap();
        let equal = OrderLine::new("o2", "CHAIR", 10).unwrap();
        let one_more = OrderLine::new("o3", "CHAIR", 11).unwrap();

        assert!(batch.can_allocate(&one_less));
        assert!(batch.can_allocate(&equal));
        assert!(!batch.can_allocate(&one_more));
    }

    #[test]
    fn cannot_allocate_if_skus_do_not_match() {
        let batch = Batch::new("batch-001", "UNCOMFORTABLE-CHAIR", 100, None);
        let line = OrderLine::new("order-123", "EXPENSIVE-TOASTER", 10).unwrap();
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn allocation_is_idempotent() {
        let (mut batch, line) = batch_and_line("ANGULAR-DESK", 20, 2);
        batch.allocate(line.clone());
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
    }

    #[test]
    fn deallocate_restores_available_quantity() {
        let (mut batch, line) = batch_and_line("EXPENSIVE-FOOTSTOOL", 20, 2);
        batch.allocate(line.clone());
        batch.deallocate(&line);
        assert_eq!(batch.available_quantity(), 20);
    }

    #[test]
    fn can_only_deallocate_allocated_lines() {
        let (mut batch, unallocated) = batch_and_line("DECORATIVE-TRINKET", 20, 2);
        batch.deallocate(&unallocated);
        assert_eq!(batch.available_quantity(), 20);
    }

    #[test]
    fn deallocate_one_removes_some_allocated_line() {
        let mut batch = Batch::new("b1", "RUG", 10, None);
        batch.allocate(OrderLine::new("o1", "RUG", 3).unwrap());
        batch.allocate(OrderLine::new("o2", "RUG", 4).unwrap());

        let line = batch.deallocate_one().unwrap();
        assert!(!batch.is_allocated(&line));
        assert_eq!(batch.available_quantity(), 10 - 7 + i64::from(line.qty()));

        batch.deallocate_one().unwrap();
        assert!(batch.deallocate_one().is_none());
        assert_eq!(batch.available_quantity(), 10);
    }

    #[test]
    fn batches_are_equal_by_reference() {
        let a = Batch::new("b1", "RUG", 10, None);
        let b = Batch::new("b1", "LAMP", 99, NaiveDate::from_ymd_opt(2030, 1, 1));
        let c = Batch::new("b2", "RUG", 10, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
