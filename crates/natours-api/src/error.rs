//! # HTTP Errors
//!
//! Every failure leaves the API as `{status, message}` where `status` is
//! `"fail"` for 4xx and `"error"` for 5xx.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use natours_core::AppError;
use serde::Serialize;
use tracing::{debug, error};

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// Build a JSON error response outside of the `ApiError` path
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let label = if status.is_client_error() { "fail" } else { "error" };
    (
        status,
        Json(ErrorResponse {
            status: label,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Handler error wrapping the core error type
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::invalid(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(AppError::invalid(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            debug!("Request rejected: {}", err);
        }

        // Store and internal failures carry driver details; keep them in the logs.
        let message = match &err {
            AppError::Store(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                "Something went very wrong!".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                status: err.status_label(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let response = ApiError(AppError::not_found("tour", "t1")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(AppError::VerificationFailed).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(AppError::Store("connection reset".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
