//! # Review Types

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub review: String,
    /// 1 to 5
    pub rating: u8,
    pub tour: String,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

/// Body of a review submission; tour and user come from the route and the token
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub review: String,
    pub rating: u8,
}

impl Review {
    pub fn create(input: NewReview, tour_id: &str, user_id: &str) -> AppResult<Self> {
        let text = input.review.trim();
        if text.is_empty() {
            return Err(AppError::invalid("Review can not be empty!"));
        }
        if !(1..=5).contains(&input.rating) {
            return Err(AppError::invalid("Rating must be between 1 and 5"));
        }
        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            review: text.to_string(),
            rating: input.rating,
            tour: tour_id.to_string(),
            user: user_id.to_string(),
            created_at: Utc::now(),
        })
    }
}
