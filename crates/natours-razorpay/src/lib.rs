//! # natours-razorpay
//!
//! Razorpay payment gateway for natours.
//!
//! - **RazorpayGateway**: `PaymentGateway` over the Orders, Payments and
//!   Refunds APIs (HTTP Basic auth with the key id and secret)
//! - **signature**: HMAC-SHA256 checks for checkout callbacks and webhooks
//! - **webhook**: parsing of signed webhook deliveries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use natours_razorpay::RazorpayGateway;
//! use natours_core::PaymentGateway;
//!
//! let gateway = RazorpayGateway::from_env()?;
//! let order = gateway.create_order(&request).await?;
//!
//! // after the checkout widget completes:
//! if gateway.verify_payment_signature(&order_id, &payment_id, &signature) {
//!     let order = gateway.fetch_order(&order_id).await?;
//! }
//! ```

pub mod client;
pub mod config;
pub mod signature;
pub mod webhook;

// Re-exports
pub use client::RazorpayGateway;
pub use config::RazorpayConfig;
pub use webhook::{parse_webhook_event, REQUIRED_WEBHOOK_EVENTS};
