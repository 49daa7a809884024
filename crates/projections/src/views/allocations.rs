//! Allocations read model: which batch each order's lines went to.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchRef, OrderId, Sku};
use domain::Event;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};

/// One allocated line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub sku: Sku,
    pub batchref: BatchRef,
}

/// Read model view of allocations by order.
///
/// `Allocated` appends a row; `Deallocated` removes the order's rows for
/// that sku. Rows keep the order they were allocated in.
#[derive(Clone)]
pub struct AllocationsView {
    orders: Arc<RwLock<HashMap<OrderId, Vec<AllocationRow>>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl AllocationsView {
    /// Creates a new empty allocations view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets the allocations of an order. Empty if the order has none.
    pub async fn allocations(&self, orderid: &OrderId) -> Vec<AllocationRow> {
        self.orders
            .read()
            .await
            .get(orderid)
            .cloned()
            .unwrap_or_default()
    }

    /// Records that an order line was allocated to a batch.
    pub async fn add(&self, orderid: OrderId, sku: Sku, batchref: BatchRef) {
        let mut orders = self.orders.write().await;
        orders
            .entry(orderid)
            .or_default()
            .push(AllocationRow { sku, batchref });
    }

    /// Number of orders with at least one allocation.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Removes every row of an order for a sku.
    pub async fn remove(&self, orderid: &OrderId, sku: &Sku) {
        let mut orders = self.orders.write().await;
        if let Some(rows) = orders.get_mut(orderid) {
            rows.retain(|row| &row.sku != sku);
            if rows.is_empty() {
                orders.remove(orderid);
            }
        }
    }
}

impl Default for AllocationsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for AllocationsView {
    fn name(&self) -> &'static str {
        "AllocationsView"
    }

    async fn handle(&self, event: &Event) {
        let applied = match event {
            Event::Allocated(data) => {
                self.add(data.orderid.clone(), data.sku.clone(), data.batchref.clone())
                    .await;
                true
            }
            Event::Deallocated(data) => {
                self.remove(&data.orderid, &data.sku).await;
                true
            }
            Event::OutOfStock(_) | Event::AllocationRequired(_) => false,
        };

        let mut pos = self.position.write().await;
        *pos = pos.record(applied);
        tracing::trace!(projection = self.name(), position = %*pos, "Event projected");
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
    }
}

#[cfg(test)]
mod tests {
    use domain::{Allocated, Deallocated, OutOfStock};

    use super::*;

    fn allocated(orderid: &str, sku: &str, batchref: &str) -> Event {
        Event::from(Allocated {
            orderid: OrderId::new(orderid),
            sku: Sku::new(sku),
            batchref: BatchRef::new(batchref),
            qty: 1,
        })
    }

    fn deallocated(orderid: &str, sku: &str) -> Event {
        Event::from(Deallocated {
            orderid: OrderId::new(orderid),
            sku: Sku::new(sku),
            qty: 1,
        })
    }

    fn row(sku: &str, batchref: &str) -> AllocationRow {
        AllocationRow {
            sku: Sku::new(sku),
            batchref: BatchRef::new(batchref),
        }
    }

    #[tokio::test]
    async fn allocated_adds_rows_in_order() {
        let view = AllocationsView::new();
        view.handle(&allocated("order1", "LAMP", "b1")).await;
        view.handle(&allocated("order1", "TABLE", "b2")).await;
        view.handle(&allocated("order2", "LAMP", "b1")).await;

        let rows = view.allocations(&OrderId::new("order1")).await;
        assert_eq!(rows, vec![row("LAMP", "b1"), row("TABLE", "b2")]);
        assert_eq!(view.order_count().await, 2);
    }

    #[tokio::test]
    async fn deallocated_removes_rows_for_that_sku_only() {
        let view = AllocationsView::new();
        view.handle(&allocated("order1", "LAMP", "b1")).await;
        view.handle(&allocated("order1", "TABLE", "b2")).await;

        view.handle(&deallocated("order1", "LAMP")).await;

        let rows = view.allocations(&OrderId::new("order1")).await;
        assert_eq!(rows, vec![row("TABLE", "b2")]);
    }

    #[tokio::test]
    async fn unknown_order_has_no_allocations() {
        let view = AllocationsView::new();
        view.handle(&deallocated("ghost", "LAMP")).await;
        assert!(view.allocations(&OrderId::new("ghost")).await.is_empty());
    }

    #[tokio::test]
    async fn other_events_are_seen_but_not_applied() {
        let view = AllocationsView::new();
        let event = Event::from(OutOfStock {
            sku: Sku::new("LAMP"),
        });

        view.handle(&event).await;

        assert_eq!(view.position().await, ProjectionPosition { seen: 1, applied: 0 });
        assert_eq!(view.order_count().await, 0);
    }

    #[tokio::test]
    async fn reset_clears_view() {
        let view = AllocationsView::new();
        view.handle(&allocated("order1", "LAMP", "b1")).await;

        view.reset().await;

        assert_eq!(view.position().await, ProjectionPosition::zero());
        assert!(view.allocations(&OrderId::new("order1")).await.is_empty());
    }

    #[test]
    fn row_serializes_as_plain_strings() {
        let json = serde_json::to_value(row("LAMP", "b1")).unwrap();
        assert_eq!(json, serde_json::json!({"sku": "LAMP", "batchref": "b1"}));
    }
}
