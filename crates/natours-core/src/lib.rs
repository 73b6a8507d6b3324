//! # natours-core
//!
//! Core types and traits for the natours booking backend.
//!
//! This crate provides:
//! - `Tour`, `User`, `Review` and `Booking` domain records
//! - `Role` and the `is_authorized` role gate
//! - `PaymentGateway` trait for hosted payment providers
//! - Store traits plus the in-memory `MemoryStore`
//! - `Checkout`: order creation, payment verification and webhook reconciliation
//! - `AppError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use natours_core::{Checkout, Currency, MemoryStore};
//!
//! let checkout = Checkout::new(store, gateway, Currency::INR);
//!
//! // Client asks for an order, pays in the gateway widget...
//! let order = checkout.create_order(&user, &tour_id).await?;
//!
//! // ...then posts back the signed confirmation
//! let booking = checkout.verify_payment(&confirmation).await?;
//! ```

pub mod booking;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod payment;
pub mod review;
pub mod role;
pub mod store;
pub mod tour;
pub mod user;

// Re-exports for convenience
pub use booking::{Booking, VerifiedPayment};
pub use checkout::{
    Checkout, CheckoutCustomer, CheckoutOrder, CheckoutTour, PaymentConfirmation, WebhookOutcome,
};
pub use error::{AppError, AppResult};
pub use gateway::{BoxedPaymentGateway, PaymentGateway};
pub use memory::{load_tour_seed, MemoryStore};
pub use payment::{
    receipt_for, Currency, GatewayOrder, OrderNotes, OrderRequest, Payment, Refund,
    RefundRequest, RefundSpeed, WebhookEvent, WebhookEventKind, MAX_RECEIPT_LEN,
};
pub use review::{NewReview, Review};
pub use role::{is_authorized, Role};
pub use store::{
    BookingFilter, BookingStore, ReviewStore, SharedStore, Store, TourStore, UserStore,
};
pub use tour::{Difficulty, NewTour, RatingStats, Tour, TourPatch, TourQuery, TourSort};
pub use user::{normalize_email, validate_new_password, User, UserProfile};
