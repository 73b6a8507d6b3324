//! Tour catalogue endpoints.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use natours_core::tour::MAX_PAGE_SIZE;
use natours_core::{
    AppError, AppResult, Difficulty, NewTour, Tour, TourPatch, TourQuery, TourSort, TourStore,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Query string of the tour listing
#[derive(Debug, Default, Deserialize)]
pub struct TourListParams {
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "price[gte]", alias = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "price[lte]", alias = "maxPrice")]
    pub max_price: Option<f64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TourListParams {
    pub fn into_query(self) -> AppResult<TourQuery> {
        let defaults = TourQuery::default();
        let page = self.page.unwrap_or(defaults.page);
        if page == 0 {
            return Err(AppError::invalid("page starts at 1"));
        }
        let limit = self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE);
        let sort = match self.sort.as_deref() {
            Some(s) => TourSort::parse(s)?,
            None => defaults.sort,
        };
        Ok(TourQuery {
            difficulty: self.difficulty,
            min_price: self.min_price,
            max_price: self.max_price,
            sort,
            page,
            limit,
        })
    }
}

pub async fn list_tours(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TourListParams>,
) -> ApiResult<Json<Value>> {
    let query = params.into_query()?;
    let tours = state.store.list_tours(&query).await?;
    Ok(Json(json!({
        "status": "success",
        "results": tours.len(),
        "data": { "tours": tours },
    })))
}

async fn load_tour(state: &AppState, id: &str) -> AppResult<Tour> {
    state
        .store
        .find_tour(id)
        .await?
        .ok_or_else(|| AppError::not_found("tour", id))
}

pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let tour = load_tour(&state, &id).await?;
    Ok(Json(json!({ "status": "success", "data": { "tour": tour } })))
}

#[instrument(skip_all, fields(name = %input.name))]
pub async fn create_tour(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewTour>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let tour = state.store.insert_tour(Tour::create(input)?).await?;
    info!("Created tour {} ({})", tour.id, tour.slug);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "tour": tour } })),
    ))
}

#[instrument(skip(state, patch))]
pub async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TourPatch>,
) -> ApiResult<Json<Value>> {
    let mut tour = load_tour(&state, &id).await?;
    tour.apply(patch)?;
    if !state.store.replace_tour(&tour).await? {
        return Err(AppError::not_found("tour", id).into());
    }
    Ok(Json(json!({ "status": "success", "data": { "tour": tour } })))
}

#[instrument(skip(state))]
pub async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_tour(&id).await? {
        return Err(AppError::not_found("tour", id).into());
    }
    info!("Deleted tour {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let query = TourListParams::default().into_query().unwrap();
        assert_eq!(query, TourQuery::default());
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = TourListParams {
            limit: Some(1000),
            sort: Some("-price".into()),
            ..Default::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.sort, TourSort::PriceDesc);
    }

    #[test]
    fn test_bad_sort_and_page_rejected() {
        let params = TourListParams {
            sort: Some("name".into()),
            ..Default::default()
        };
        assert!(params.into_query().is_err());

        let params = TourListParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(params.into_query().is_err());
    }
}
