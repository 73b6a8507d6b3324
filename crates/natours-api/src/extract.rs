//! Extractors whose rejections use the API error body.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

/// `Json` with `{status, message}` rejections
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` with `{status, message}` rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
