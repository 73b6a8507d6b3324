//! Review endpoints. Creating or deleting a review refreshes the tour's
//! rating summary.

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use natours_core::{
    AppError, AppResult, NewReview, RatingStats, Review, ReviewStore, Role, TourStore,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListParams {
    pub tour: Option<String>,
}

fn review_list(reviews: Vec<Review>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "results": reviews.len(),
        "data": { "reviews": reviews },
    }))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ReviewListParams>,
) -> ApiResult<Json<Value>> {
    let reviews = state.store.list_reviews(params.tour.as_deref()).await?;
    Ok(review_list(reviews))
}

pub async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reviews = state.store.list_reviews(Some(&tour_id)).await?;
    Ok(review_list(reviews))
}

#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tour_id): Path<String>,
    ApiJson(input): ApiJson<NewReview>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if state.store.find_tour(&tour_id).await?.is_none() {
        return Err(AppError::not_found("tour", tour_id).into());
    }

    let review = Review::create(input, &tour_id, &user.id)?;
    let review = state.store.insert_review(review).await?;
    refresh_ratings(&state, &tour_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "review": review } })),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let review = state
        .store
        .find_review(&id)
        .await?
        .ok_or_else(|| AppError::not_found("review", &id))?;

    if review.user != user.id && user.role != Role::Admin {
        return Err(AppError::Forbidden.into());
    }

    state.store.delete_review(&id).await?;
    refresh_ratings(&state, &review.tour).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recompute a tour's rating quantity and average from its reviews
async fn refresh_ratings(state: &AppState, tour_id: &str) -> AppResult<()> {
    let ratings: Vec<u8> = state
        .store
        .list_reviews(Some(tour_id))
        .await?
        .iter()
        .map(|r| r.rating)
        .collect();
    let stats = RatingStats::from_ratings(&ratings);
    debug!(
        "Tour {} ratings: quantity={}, average={}",
        tour_id, stats.quantity, stats.average
    );
    state.store.set_tour_ratings(tour_id, stats).await
}
