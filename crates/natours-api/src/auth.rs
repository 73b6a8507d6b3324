//! # Authentication
//!
//! Password hashing (argon2), bearer tokens (HS256 JWT) and the two request
//! gates:
//!
//! - [`require_auth`] resolves the bearer token to a live [`User`] and stores
//!   it in the request extensions as [`CurrentUser`]
//! - [`restrict_to`] checks the current user's role against a fixed set with
//!   [`is_authorized`] before the handler runs
//!
//! ```rust,ignore
//! let admin = Router::new()
//!     .route("/refund/{id}", post(refund))
//!     .route_layer(from_fn_with_state(RequiredRoles(&[Role::Admin]), restrict_to));
//! let protected = Router::new()
//!     .merge(admin)
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//! ```

use crate::error::ApiError;
use crate::state::AppState;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use natours_core::{is_authorized, AppError, AppResult, Role, User, UserStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for bearer tokens
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn sign(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AppError::Unauthenticated("Invalid token. Please log in again!".to_string())
            })
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// The authenticated caller, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Roles accepted by a [`restrict_to`] layer
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [Role]);

fn extract_bearer(headers: &HeaderMap) -> AppResult<&str> {
    let missing = || {
        AppError::Unauthenticated(
            "You are not logged in! Please log in to get access.".to_string(),
        )
    };

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(missing)?;

    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let claims = state.jwt.verify(token)?;

    let user = state
        .store
        .find_user(&claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| {
            AppError::Unauthenticated(
                "The user belonging to this token does no longer exist.".to_string(),
            )
        })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

pub async fn restrict_to(
    State(RequiredRoles(roles)): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = req
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.role)
        .ok_or_else(|| AppError::Unauthenticated("You are not logged in!".to_string()))?;

    if !is_authorized(role, roles) {
        debug!("Role {} rejected, requires {:?}", role, roles);
        return Err(AppError::Forbidden.into());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> JwtKeys {
        JwtKeys::new("a-test-secret-that-is-long-enough!!", Duration::days(90))
    }

    #[test]
    fn test_token_round_trip() {
        let user = User::new("Jonas", "jonas@example.com", "hash")
            .unwrap()
            .with_role(Role::LeadGuide);
        let token = keys().sign(&user).unwrap();
        let claims = keys().verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::LeadGuide);
        assert_eq!(claims.exp - claims.iat, Duration::days(90).num_seconds());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let user = User::new("Jonas", "jonas@example.com", "hash").unwrap();
        let other = JwtKeys::new("another-secret-that-is-long-enough!", Duration::days(1));
        let token = other.sign(&user).unwrap();

        let err = keys().verify(&token).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_expired_token_rejected() {
        let user = User::new("Jonas", "jonas@example.com", "hash").unwrap();
        let expired = JwtKeys::new("a-test-secret-that-is-long-enough!!", Duration::days(-1));
        let token = expired.sign(&user).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = hash_password("pass1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pass1234", &hash));
        assert!(!verify_password("pass12345", &hash));
        assert!(!verify_password("pass1234", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def");
    }
}
