use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohort_storage::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::service::ServiceError;

/// Everything a handler can fail with, rendered as
/// `{"outcome": "error", "code": "...", "message": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Missing or invalid identity headers")]
    Unauthenticated,
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Service(ServiceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ApiError::Service(ServiceError::Policy(_)) => (StatusCode::CONFLICT, "policy_violation"),
            ApiError::Service(ServiceError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Service(ServiceError::Forbidden(_)) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Service(ServiceError::Store(StoreError::Conflict)) => {
                (StatusCode::CONFLICT, "conflict")
            }
            ApiError::Service(ServiceError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::warn!(code, error = %self, "request rejected");
            self.to_string()
        };

        (
            status,
            Json(json!({ "outcome": "error", "code": code, "message": message })),
        )
            .into_response()
    }
}
