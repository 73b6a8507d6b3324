//! # In-memory Store
//!
//! Process-local implementation of the store traits. Used when no database
//! is configured and by the test suites. Tours can be seeded from a TOML file:
//!
//! ```toml
//! [[tours]]
//! name = "The Forest Hiker"
//! duration = 5
//! maxGroupSize = 25
//! difficulty = "easy"
//! price = 397
//! summary = "Breathtaking hike through the Canadian Banff National Park"
//! imageCover = "tour-1-cover.jpg"
//! ```

use crate::booking::Booking;
use crate::error::{AppError, AppResult};
use crate::review::Review;
use crate::store::{BookingFilter, BookingStore, ReviewStore, TourStore, UserStore};
use crate::tour::{NewTour, RatingStats, Tour, TourQuery, TourSort};
use crate::user::User;
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    tours: Vec<Tour>,
    users: Vec<User>,
    reviews: Vec<Review>,
    bookings: Vec<Booking>,
}

/// Vec-backed store guarded by a single lock
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with tours
    pub fn with_tours(tours: Vec<Tour>) -> Self {
        Self {
            inner: RwLock::new(Collections {
                tours,
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TourSeed {
    #[serde(default)]
    tours: Vec<NewTour>,
}

/// Parse and validate a TOML tour seed document
pub fn load_tour_seed(content: &str) -> AppResult<Vec<Tour>> {
    let seed: TourSeed = toml::from_str(content)
        .map_err(|e| AppError::Configuration(format!("invalid tour seed: {}", e)))?;
    seed.tours.into_iter().map(Tour::create).collect()
}

fn compare_tours(sort: TourSort, a: &Tour, b: &Tour) -> Ordering {
    match sort {
        TourSort::PriceAsc => a.price.total_cmp(&b.price),
        TourSort::PriceDesc => b.price.total_cmp(&a.price),
        TourSort::RatingAsc => a.ratings_average.total_cmp(&b.ratings_average),
        TourSort::RatingDesc => b.ratings_average.total_cmp(&a.ratings_average),
        TourSort::Newest => b.created_at.cmp(&a.created_at),
    }
}

#[async_trait]
impl TourStore for MemoryStore {
    async fn list_tours(&self, query: &TourQuery) -> AppResult<Vec<Tour>> {
        let inner = self.inner.read().await;
        let mut tours: Vec<Tour> = inner
            .tours
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        tours.sort_by(|a, b| compare_tours(query.sort, a, b));
        Ok(tours
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn find_tour(&self, id: &str) -> AppResult<Option<Tour>> {
        let inner = self.inner.read().await;
        Ok(inner.tours.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_tour(&self, tour: Tour) -> AppResult<Tour> {
        let mut inner = self.inner.write().await;
        if inner.tours.iter().any(|t| t.name == tour.name) {
            return Err(AppError::Conflict(format!(
                "A tour named '{}' already exists",
                tour.name
            )));
        }
        inner.tours.push(tour.clone());
        Ok(tour)
    }

    async fn replace_tour(&self, tour: &Tour) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.tours.iter_mut().find(|t| t.id == tour.id) {
            Some(slot) => {
                *slot = tour.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tour(&self, id: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.tours.len();
        inner.tours.retain(|t| t.id != id);
        Ok(inner.tours.len() != before)
    }

    async fn set_tour_ratings(&self, id: &str, stats: RatingStats) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(tour) = inner.tours.iter_mut().find(|t| t.id == id) {
            tour.ratings_quantity = stats.quantity;
            tour.ratings_average = stats.average;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.inner.read().await.users.clone())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: Review) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        if inner
            .reviews
            .iter()
            .any(|r| r.tour == review.tour && r.user == review.user)
        {
            return Err(AppError::Conflict(
                "You have already reviewed this tour".to_string(),
            ));
        }
        inner.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: &str) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reviews(&self, tour_id: Option<&str>) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| tour_id.map_or(true, |t| r.tour == t))
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.reviews.len();
        inner.reviews.retain(|r| r.id != id);
        Ok(inner.reviews.len() != before)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: Booking) -> AppResult<Booking> {
        let mut inner = self.inner.write().await;
        if inner
            .bookings
            .iter()
            .any(|b| b.payment_id == booking.payment_id)
        {
            return Err(AppError::Conflict(format!(
                "Booking already recorded for payment {}",
                booking.payment_id
            )));
        }
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: &str) -> AppResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_booking_by_payment(&self, payment_id: &str) -> AppResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookings
            .iter()
            .find(|b| b.payment_id == payment_id)
            .cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookings
            .iter()
            .filter(|b| filter.user.as_deref().map_or(true, |u| b.user == u))
            .filter(|b| filter.tour.as_deref().map_or(true, |t| b.tour == t))
            .cloned()
            .collect())
    }
}
