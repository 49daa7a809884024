//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ProductError;
use service::ServiceError;
use storage::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Error raised while handling a command.
    Service(ServiceError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::InvalidSku(_) => StatusCode::BAD_REQUEST,
        ServiceError::UnknownBatch(_) => StatusCode::NOT_FOUND,
        ServiceError::Product(product_err) => match product_err {
            ProductError::InvalidQuantity { .. } | ProductError::SkuMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            ProductError::BatchNotFound { .. } => StatusCode::NOT_FOUND,
            ProductError::DuplicateBatch { .. } => StatusCode::CONFLICT,
        },
        ServiceError::Store(
            StoreError::ConcurrencyConflict { .. }
            | StoreError::DuplicateProduct(_)
            | StoreError::DuplicateBatch(_),
        ) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
    }
    (status, err.to_string())
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
