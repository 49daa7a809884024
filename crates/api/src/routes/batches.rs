//! Batch and allocation command endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use domain::{Allocate, CreateBatch};
use serde::{Deserialize, Serialize};
use service::{BatchSummary, views};
use storage::ProductStorage;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddBatchRequest {
    #[serde(rename = "ref")]
    pub reference: BatchRef,
    pub sku: Sku,
    pub qty: u32,
    #[serde(default)]
    pub eta: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

// -- Response types --

/// Commands may cascade through the bus after the response, so callers read
/// the outcome from `GET /allocations/{orderid}`.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

impl AcceptedResponse {
    fn accepted() -> Self {
        Self { status: "accepted" }
    }
}

// -- Handlers --

/// POST /add_batch: register a batch of stock.
#[tracing::instrument(skip_all, fields(batchref = %req.reference, sku = %req.sku))]
pub async fn add_batch<S: ProductStorage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddBatchRequest>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.bus.unit_of_work();
    state
        .bus
        .handle(
            CreateBatch::new(req.reference, req.sku, req.qty, req.eta),
            &mut uow,
        )
        .await?;

    Ok(StatusCode::CREATED)
}

/// POST /allocate: allocate an order line.
///
/// Accepted even when no batch has stock; the shortage is reported through
/// the out-of-stock notification.
#[tracing::instrument(skip_all, fields(orderid = %req.orderid, sku = %req.sku))]
pub async fn allocate<S: ProductStorage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AllocateRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let mut uow = state.bus.unit_of_work();
    state
        .bus
        .handle(Allocate::new(req.orderid, req.sku, req.qty), &mut uow)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::accepted())))
}

/// GET /batches: every batch with its remaining stock.
#[tracing::instrument(skip_all)]
pub async fn list<S: ProductStorage>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<BatchSummary>>, ApiError> {
    let mut uow = state.bus.unit_of_work();
    let batches = views::batches(&mut uow).await?;
    Ok(Json(batches))
}

/// POST /change_batch_quantity: publish a quantity change for the subscriber.
///
/// The body is forwarded untouched; malformed payloads are logged and
/// skipped by the subscriber.
#[tracing::instrument(skip_all)]
pub async fn change_batch_quantity<S: ProductStorage>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    state
        .change_batch_quantity
        .send(payload)
        .await
        .map_err(|_| ApiError::Internal("change_batch_quantity subscriber stopped".to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::accepted())))
}
