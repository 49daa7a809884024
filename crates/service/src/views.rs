//! Read-side queries.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use projections::{AllocationRow, AllocationsView};
use serde::Serialize;
use storage::ProductStorage;

use crate::Result;
use crate::unit_of_work::UnitOfWork;

/// Returns the `{sku, batchref}` rows allocated to an order.
pub async fn allocations(orderid: &OrderId, view: &AllocationsView) -> Vec<AllocationRow> {
    view.allocations(orderid).await
}

/// One batch as shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub reference: BatchRef,
    pub sku: Sku,
    pub purchased_quantity: u32,
    pub available_quantity: i64,
    pub eta: Option<NaiveDate>,
}

/// Lists every batch, sorted by sku then reference. Never commits.
pub async fn batches<S: ProductStorage>(uow: &mut UnitOfWork<S>) -> Result<Vec<BatchSummary>> {
    let mut scope = uow.begin().await?;

    let mut summaries: Vec<BatchSummary> = scope
        .products
        .list()
        .await?
        .into_iter()
        .flat_map(|product| product.batches())
        .map(|batch| BatchSummary {
            reference: batch.reference().clone(),
            sku: batch.sku().clone(),
            purchased_quantity: batch.purchased_quantity(),
            available_quantity: batch.available_quantity(),
            eta: batch.eta(),
        })
        .collect();
    summaries.sort_by(|a, b| (&a.sku, &a.reference).cmp(&(&b.sku, &b.reference)));

    scope.rollback();
    Ok(summaries)
}
