//! # Request Handlers
//!
//! Handlers return `ApiResult<_>`; success bodies follow the
//! `{status: "success", ...}` envelope.

pub mod bookings;
pub mod health;
pub mod payments;
pub mod reviews;
pub mod tours;
pub mod users;
