//! Read-only booking endpoints. Bookings are written by the checkout flow.

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use natours_core::{AppError, Booking, BookingFilter, BookingStore};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    pub user: Option<String>,
    pub tour: Option<String>,
}

fn booking_list(bookings: Vec<Booking>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "results": bookings.len(),
        "data": { "bookings": bookings },
    }))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Value>> {
    let filter = BookingFilter {
        user: Some(user.id),
        tour: None,
    };
    Ok(booking_list(state.store.list_bookings(&filter).await?))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BookingListParams>,
) -> ApiResult<Json<Value>> {
    let filter = BookingFilter {
        user: params.user,
        tour: params.tour,
    };
    Ok(booking_list(state.store.list_bookings(&filter).await?))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let booking = state
        .store
        .find_booking(&id)
        .await?
        .ok_or_else(|| AppError::not_found("booking", &id))?;
    Ok(Json(json!({ "status": "success", "data": { "booking": booking } })))
}
