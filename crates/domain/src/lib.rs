//! Domain layer for the allocation service.
//!
//! This crate provides:
//! - [`Aggregate`] and [`DomainEvent`] traits
//! - The [`Product`] aggregate owning [`Batch`]es and the allocation algorithm
//! - The [`Command`] and [`Event`] vocabulary, unified as [`Message`]

pub mod aggregate;
pub mod message;
pub mod product;

pub use aggregate::{Aggregate, DomainEvent};
pub use common::{BatchRef, OrderId, Sku, Version};
pub use message::Message;
pub use product::{
    Allocate, Allocated, AllocationRequired, Batch, ChangeBatchQuantity, Command, CommandKind,
    CreateBatch, Deallocated, Event, EventKind, OrderLine, OutOfStock, Product, ProductError,
};
