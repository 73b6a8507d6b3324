//! # natours-api
//!
//! HTTP API layer for natours.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Razorpay checkout endpoints and the webhook receiver
//! - Tours, users, reviews and bookings REST endpoints
//! - Bearer-token authentication and role gates
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/webhook-checkout` | Razorpay webhook |
//! | POST | `/api/v1/razorpay/create-order/{tourId}` | Create gateway order |
//! | POST | `/api/v1/razorpay/verify-payment` | Verify payment, record booking |
//! | GET | `/api/v1/razorpay/payment/{paymentId}` | Payment details |
//! | POST | `/api/v1/razorpay/refund/{paymentId}` | Refund (admin) |
//! | * | `/api/v1/{tours,users,reviews,bookings}` | Resource endpoints |

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::AppState;
