//! Product domain events.

use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::Allocate;

/// Events record facts. Each kind has zero or more handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// An allocation request found no batch with enough stock.
    OutOfStock(OutOfStock),

    /// An order line was allocated to a batch.
    Allocated(Allocated),

    /// An order line was removed from its batch.
    Deallocated(Deallocated),

    /// A displaced order line needs to be allocated again.
    AllocationRequired(AllocationRequired),
}

/// Tag identifying an event variant, used as handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OutOfStock,
    Allocated,
    Deallocated,
    AllocationRequired,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OutOfStock => "OutOfStock",
            EventKind::Allocated => "Allocated",
            EventKind::Deallocated => "Deallocated",
            EventKind::AllocationRequired => "AllocationRequired",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OutOfStock(_) => EventKind::OutOfStock,
            Event::Allocated(_) => EventKind::Allocated,
            Event::Deallocated(_) => EventKind::Deallocated,
            Event::AllocationRequired(_) => EventKind::AllocationRequired,
        }
    }
}

impl DomainEvent for Event {
    fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Data for OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStock {
    pub sku: Sku,
}

/// Data for Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocated {
    pub orderid: OrderId,
    pub sku: Sku,
    pub batchref: BatchRef,
    pub qty: u32,
}

/// Data for Deallocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deallocated {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

/// Data for AllocationRequired event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequired {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl From<AllocationRequired> for Allocate {
    fn from(event: AllocationRequired) -> Self {
        Allocate {
            orderid: event.orderid,
            sku: event.sku,
            qty: event.qty,
        }
    }
}

impl From<OutOfStock> for Event {
    fn from(event: OutOfStock) -> Self {
        Event::OutOfStock(event)
    }
}

impl From<Allocated> for Event {
    fn from(event: Allocated) -> Self {
        Event::Allocated(event)
    }
}

impl From<Deallocated> for Event {
    fn from(event: Deallocated) -> Self {
        Event::Deallocated(event)
    }
}

impl From<AllocationRequired> for Event {
    fn from(event: AllocationRequired) -> Self {
        Event::AllocationRequired(event)
    }
}
