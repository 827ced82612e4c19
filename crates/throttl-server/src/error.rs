//! HTTP error mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use throttl_common::{ThrottlError, ValidationError};
use throttl_store::StoreError;

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError(pub ThrottlError);

impl From<ThrottlError> for ApiError {
    fn from(err: ThrottlError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError(ThrottlError::Validation(err))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(ValidationError::field("body", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_client_error() {
            debug!(error = %err, "Rejected request");
        } else {
            error!(error = %err, "Request failed");
        }

        match err {
            ThrottlError::Validation(validation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "VALIDATION_ERROR",
                    "message": "Request validation failed",
                    "details": validation.errors,
                })),
            )
                .into_response(),
            ThrottlError::NotFound { kind, .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": format!("{kind} not found") })),
            )
                .into_response(),
            ThrottlError::StoreUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "STORE_UNAVAILABLE",
                    "message": message,
                })),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "INTERNAL_ERROR",
                    "message": "An unexpected error occurred",
                })),
            )
                .into_response(),
        }
    }
}
