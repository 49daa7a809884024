//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use service::{Dependencies, InMemoryNotifications, RetryPolicy};
use storage::InMemoryStorage;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_notifications().0
}

fn setup_with_notifications() -> (axum::Router, InMemoryNotifications) {
    let notifications = InMemoryNotifications::new();
    let dependencies = Dependencies {
        notifications: Arc::new(notifications.clone()),
        ..Dependencies::default()
    };
    let state = api::create_default_state(
        InMemoryStorage::new(),
        dependencies,
        RetryPolicy::immediate(3),
    )
    .unwrap();
    let app = api::create_app(state, get_metrics_handle());
    (app, notifications)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn add_batch(app: &axum::Router, reference: &str, sku: &str, qty: u32, eta: Option<&str>) {
    let (status, _) = send(
        app,
        "POST",
        "/add_batch",
        Some(serde_json::json!({"ref": reference, "sku": sku, "qty": qty, "eta": eta})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn allocate(
    app: &axum::Router,
    orderid: &str,
    sku: &str,
    qty: u32,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        "POST",
        "/allocate",
        Some(serde_json::json!({"orderid": orderid, "sku": sku, "qty": qty})),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_allocate_returns_accepted_and_records_allocation() {
    let app = setup();
    add_batch(&app, "early-batch", "API-SKU-1", 100, Some("2011-01-01")).await;
    add_batch(&app, "later-batch", "API-SKU-1", 100, Some("2011-01-02")).await;
    add_batch(&app, "other-batch", "API-SKU-2", 100, None).await;

    let (status, json) = allocate(&app, "order-1", "API-SKU-1", 3).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json, serde_json::json!({"status": "accepted"}));

    let (status, json) = send(&app, "GET", "/allocations/order-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!([{"sku": "API-SKU-1", "batchref": "early-batch"}])
    );
}

#[tokio::test]
async fn test_unknown_sku_is_a_bad_request() {
    let app = setup();

    let (status, json) = allocate(&app, "order-1", "UNKNOWN-SKU", 20).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid sku UNKNOWN-SKU");
}

#[tokio::test]
async fn test_zero_quantity_is_a_bad_request() {
    let app = setup();
    add_batch(&app, "b1", "API-SKU-ZERO", 10, None).await;

    let (status, _) = allocate(&app, "order-1", "API-SKU-ZERO", 0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_batch_is_a_conflict() {
    let app = setup();
    add_batch(&app, "b1", "API-SKU-DUP", 10, None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/add_batch",
        Some(serde_json::json!({"ref": "b1", "sku": "API-SKU-DUP", "qty": 5, "eta": null})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("b1"));
}

#[tokio::test]
async fn test_out_of_stock_is_accepted_and_notified() {
    let (app, notifications) = setup_with_notifications();
    add_batch(&app, "small-batch", "API-SKU-OOS", 5, None).await;

    let (status, json) = allocate(&app, "order-1", "API-SKU-OOS", 10).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json, serde_json::json!({"status": "accepted"}));
    assert_eq!(
        notifications.sent("stock@made.com").await,
        vec!["Out of stock for API-SKU-OOS"]
    );

    let (status, _) = send(&app, "GET", "/allocations/order-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/allocations/nobody", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_list_batches() {
    let app = setup();
    add_batch(&app, "b2", "API-SKU-LIST", 20, Some("2011-01-02")).await;
    add_batch(&app, "b1", "API-SKU-LIST", 10, None).await;
    allocate(&app, "order-1", "API-SKU-LIST", 4).await;

    let (status, json) = send(&app, "GET", "/batches", None).await;

    assert_eq!(status, StatusCode::OK);
    let batches = json.as_array().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0]["reference"], "b1");
    assert_eq!(batches[0]["available_quantity"], 6);
    assert_eq!(batches[0]["eta"], serde_json::Value::Null);
    assert_eq!(batches[1]["reference"], "b2");
    assert_eq!(batches[1]["eta"], "2011-01-02");
}

#[tokio::test]
async fn test_change_batch_quantity_reallocates() {
    let app = setup();
    add_batch(&app, "b1", "API-SKU-CHANGE", 50, None).await;
    add_batch(&app, "b2", "API-SKU-CHANGE", 50, Some("2011-01-02")).await;
    allocate(&app, "order-1", "API-SKU-CHANGE", 20).await;
    allocate(&app, "order-2", "API-SKU-CHANGE", 20).await;

    let (status, json) = send(
        &app,
        "POST",
        "/change_batch_quantity",
        Some(serde_json::json!({"batchref": "b1", "qty": 25})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "accepted");

    // The subscriber runs in the background; wait for the shed order to land on b2.
    let mut b2_available = None;
    for _ in 0..50 {
        let (_, json) = send(&app, "GET", "/batches", None).await;
        let available = json.as_array().unwrap()[1]["available_quantity"].as_i64();
        if available == Some(30) {
            b2_available = available;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(b2_available, Some(30));

    let (_, json) = send(&app, "GET", "/batches", None).await;
    assert_eq!(json[0]["available_quantity"], 5);
}

#[tokio::test]
async fn test_malformed_quantity_change_is_accepted_and_skipped() {
    let app = setup();
    add_batch(&app, "b1", "API-SKU-MALFORMED", 50, None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/change_batch_quantity",
        Some(serde_json::json!({"reference": "b1"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    add_batch(&app, "b1", "API-SKU-METRICS", 50, None).await;

    let (status, _) = send(&app, "GET", "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
}
