//! HTTP API for the allocation service.
//!
//! Provides REST endpoints for batches and allocations, an in-process
//! subscriber for batch quantity changes, structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod subscriber;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::AllocationsView;
use service::{Dependencies, MessageBus, RetryPolicy, bootstrap};
use storage::ProductStorage;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Messages buffered on the `change_batch_quantity` topic.
const TOPIC_CAPACITY: usize = 256;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ProductStorage> {
    pub bus: Arc<MessageBus<S>>,
    pub allocations: AllocationsView,
    /// Publishes raw payloads on the `change_batch_quantity` topic.
    pub change_batch_quantity: mpsc::Sender<serde_json::Value>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ProductStorage>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/add_batch", post(routes::batches::add_batch::<S>))
        .route("/allocate", post(routes::batches::allocate::<S>))
        .route("/batches", get(routes::batches::list::<S>))
        .route(
            "/change_batch_quantity",
            post(routes::batches::change_batch_quantity::<S>),
        )
        .route("/allocations/{orderid}", get(routes::allocations::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the message bus and starts the topic subscriber.
///
/// Must be called from within a tokio runtime.
pub fn create_default_state<S: ProductStorage>(
    storage: S,
    dependencies: Dependencies,
    retry: RetryPolicy,
) -> service::Result<Arc<AppState<S>>> {
    let allocations = dependencies.allocations.clone();
    let bus = Arc::new(bootstrap(storage, dependencies, retry)?);

    let (sender, receiver) = mpsc::channel(TOPIC_CAPACITY);
    subscriber::spawn(Arc::clone(&bus), receiver);

    Ok(Arc::new(AppState {
        bus,
        allocations,
        change_batch_quantity: sender,
    }))
}
