//! # Store Traits
//!
//! Async repository traits over the document store. Implementations:
//! [`MemoryStore`](crate::memory::MemoryStore) here, and the MongoDB store in
//! `natours-mongo`.
//!
//! Stores persist what they are given. Ids, timestamps and validation are the
//! domain types' job.

use crate::booking::Booking;
use crate::error::AppResult;
use crate::review::Review;
use crate::tour::{RatingStats, Tour, TourQuery};
use crate::user::User;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait TourStore: Send + Sync {
    async fn list_tours(&self, query: &TourQuery) -> AppResult<Vec<Tour>>;

    async fn find_tour(&self, id: &str) -> AppResult<Option<Tour>>;

    async fn insert_tour(&self, tour: Tour) -> AppResult<Tour>;

    /// Replace a stored tour; `false` when no tour has that id
    async fn replace_tour(&self, tour: &Tour) -> AppResult<bool>;

    async fn delete_tour(&self, id: &str) -> AppResult<bool>;

    async fn set_tour_ratings(&self, id: &str, stats: RatingStats) -> AppResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the e-mail is already registered
    async fn insert_user(&self, user: User) -> AppResult<User>;

    async fn find_user(&self, id: &str) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `Conflict` when the user already reviewed the tour
    async fn insert_review(&self, review: Review) -> AppResult<Review>;

    async fn find_review(&self, id: &str) -> AppResult<Option<Review>>;

    async fn list_reviews(&self, tour_id: Option<&str>) -> AppResult<Vec<Review>>;

    async fn delete_review(&self, id: &str) -> AppResult<bool>;
}

/// Filters for booking listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub user: Option<String>,
    pub tour: Option<String>,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fails with `Conflict` when a booking already exists for the payment id
    async fn insert_booking(&self, booking: Booking) -> AppResult<Booking>;

    async fn find_booking(&self, id: &str) -> AppResult<Option<Booking>>;

    async fn find_booking_by_payment(&self, payment_id: &str) -> AppResult<Option<Booking>>;

    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>>;
}

/// Everything the application needs from persistence
pub trait Store: TourStore + UserStore + ReviewStore + BookingStore {}

impl<T> Store for T where T: TourStore + UserStore + ReviewStore + BookingStore {}

pub type SharedStore = Arc<dyn Store>;
