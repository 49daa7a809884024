//! Read model views for the query side.

pub mod allocations;

pub use allocations::{AllocationRow, AllocationsView};
