//! Allocations read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use projections::AllocationRow;
use service::views;
use storage::ProductStorage;

use crate::AppState;
use crate::error::ApiError;

/// GET /allocations/{orderid}: the batches an order's lines went to.
///
/// Served from the read model, so it never touches product storage.
#[tracing::instrument(skip(state))]
pub async fn get<S: ProductStorage>(
    State(state): State<Arc<AppState<S>>>,
    Path(orderid): Path<String>,
) -> Result<Json<Vec<AllocationRow>>, ApiError> {
    let orderid = OrderId::new(orderid);
    let rows = views::allocations(&orderid, &state.allocations).await;

    if rows.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No allocations for order {orderid}"
        )));
    }
    Ok(Json(rows))
}
