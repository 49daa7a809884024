//! Identifier and version types shared by every crate in the workspace.

mod types;

pub use types::{BatchRef, OrderId, Sku, Version};
