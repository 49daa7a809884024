//! Read models for the query side.
//!
//! This crate provides:
//! - [`Projection`] trait for applying domain events to read models
//! - [`AllocationsView`], the allocations-by-order read model

pub mod projection;
pub mod views;

pub use projection::{Projection, ProjectionPosition};
pub use views::{AllocationRow, AllocationsView};
