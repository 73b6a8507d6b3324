//! Sign-up, login and profile endpoints.

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use natours_core::{validate_new_password, AppError, User, UserProfile, UserStore};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn token_response(token: String, user: &User) -> Json<Value> {
    Json(json!({
        "status": "success",
        "token": token,
        "data": { "user": user.profile() },
    }))
}

#[instrument(skip_all, fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_new_password(&request.password, &request.password_confirm)?;
    let password_hash = hash_password(&request.password)?;

    // Role is never taken from the request.
    let user = User::new(request.name, request.email, password_hash)?;
    let user = state.store.insert_user(user).await?;
    info!("New user {}", user.id);

    let token = state.jwt.sign(&user)?;
    Ok((StatusCode::CREATED, token_response(token, &user)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(AppError::invalid("Please provide email and password!").into());
    };

    let incorrect = || AppError::Unauthenticated("Incorrect email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&email.trim().to_lowercase())
        .await?
        .filter(|u| u.active)
        .ok_or_else(incorrect)?;

    if !verify_password(&password, &user.password_hash) {
        return Err(incorrect().into());
    }

    let token = state.jwt.sign(&user)?;
    Ok(token_response(token, &user))
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "status": "success", "data": { "user": user.profile() } }))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let users: Vec<UserProfile> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();
    Ok(Json(json!({
        "status": "success",
        "results": users.len(),
        "data": { "users": users },
    })))
}
