//! # Routes
//!
//! Axum router configuration for the natours API.
//!
//! Routes:
//! - `GET  /health` - Health check
//! - `POST /webhook-checkout` - Razorpay webhook (raw body, signature checked)
//!
//! - Payments (`/api/v1/razorpay`, logged in):
//!   - `POST /create-order/{tourId}`
//!   - `POST /verify-payment`
//!   - `GET  /payment/{paymentId}`
//!   - `POST /refund/{paymentId}` - admin
//!
//! - Tours (`/api/v1/tours`): list/get public; create, update, delete for
//!   admin and lead-guide; `/{id}/reviews` list public, create for users
//! - Users (`/api/v1/users`): signup, login, `/me`; list for admin
//! - Reviews (`/api/v1/reviews`): list public; delete by author or admin
//! - Bookings (`/api/v1/bookings`): `/my`; list and get for admin and lead-guide
//!
//! Role checks run as route layers after the auth layer, so a request without
//! a valid token is rejected with 401 before its role is looked at.

use crate::auth::{require_auth, restrict_to, RequiredRoles};
use crate::error::json_error;
use crate::handlers::{bookings, health, payments, reviews, tours, users};
use crate::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use natours_core::Role;
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const ADMIN: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide];
const MEMBERS: &[Role] = &[Role::User];

/// JSON bodies above this size are rejected
pub const BODY_LIMIT_BYTES: usize = 20 * 1024;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/razorpay", payment_routes(&state))
        .nest("/tours", tour_routes(&state))
        .nest("/users", user_routes(&state))
        .nest("/reviews", review_routes(&state))
        .nest("/bookings", booking_routes(&state));

    if let Some(limiter) =
        RateLimitState::per_hour(state.config.rate_limit_per_hour, state.config.trust_proxy)
    {
        info!(
            "Rate limit: {} requests per hour per IP on /api (trust proxy: {})",
            state.config.rate_limit_per_hour, state.config.trust_proxy
        );
        api = api.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ));

    Router::new()
        // Health check at root
        .route("/health", get(health::health))
        .route("/", get(health::health))
        // Webhook (raw body, no token)
        .route("/webhook-checkout", post(payments::webhook_checkout))
        // API v1
        .nest("/api/v1", api)
        .fallback(health::not_found)
        // Middleware
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors(&state.config.cors_origins))
                .layer(CompressionLayer::new())
                .layer(security_headers),
        )
        // State
        .with_state(state)
}

fn payment_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/refund/{payment_id}", post(payments::refund))
        .route_layer(from_fn_with_state(RequiredRoles(ADMIN), restrict_to));

    Router::new()
        .route("/create-order/{tour_id}", post(payments::create_order))
        .route("/verify-payment", post(payments::verify_payment))
        .route("/payment/{payment_id}", get(payments::payment_details))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn tour_routes(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/", post(tours::create_tour))
        .route("/{id}", patch(tours::update_tour).delete(tours::delete_tour))
        .route_layer(from_fn_with_state(RequiredRoles(STAFF), restrict_to));

    let members = Router::new()
        .route("/{id}/reviews", post(reviews::create_review))
        .route_layer(from_fn_with_state(RequiredRoles(MEMBERS), restrict_to));

    let protected = Router::new()
        .merge(staff)
        .merge(members)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(tours::list_tours))
        .route("/{id}", get(tours::get_tour))
        .route("/{id}/reviews", get(reviews::list_tour_reviews))
        .merge(protected)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(users::list_users))
        .route_layer(from_fn_with_state(RequiredRoles(ADMIN), restrict_to));

    let protected = Router::new()
        .route("/me", get(users::me))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .merge(protected)
}

fn review_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/{id}", delete(reviews::delete_review))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(reviews::list_reviews))
        .merge(protected)
}

fn booking_routes(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/", get(bookings::list_bookings))
        .route("/{id}", get(bookings::get_booking))
        .route_layer(from_fn_with_state(RequiredRoles(STAFF), restrict_to));

    Router::new()
        .route("/my", get(bookings::my_bookings))
        .merge(staff)
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-razorpay-signature"),
        ])
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Something went very wrong!")
}
