//! # Tour Types
//!
//! Tours are the bookable products. Prices are held in the major currency
//! unit; the checkout flow scales them to the gateway's minor unit.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// Tour difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// A bookable tour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Length in days
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    /// Price in the major currency unit
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    /// Build a new tour from validated input
    pub fn create(input: NewTour) -> AppResult<Self> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            slug: slugify(&input.name),
            name: input.name.trim().to_string(),
            duration: input.duration,
            max_group_size: input.max_group_size,
            difficulty: input.difficulty,
            ratings_average: DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            price: input.price,
            price_discount: input.price_discount,
            summary: input.summary.trim().to_string(),
            description: input.description,
            image_cover: input.image_cover,
            images: input.images,
            start_dates: input.start_dates,
            created_at: Utc::now(),
        })
    }

    /// Apply a partial update, re-validating the merged result
    pub fn apply(&mut self, patch: TourPatch) -> AppResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            validate_name(&name)?;
            next.slug = slugify(&name);
            next.name = name.trim().to_string();
        }
        if let Some(duration) = patch.duration {
            next.duration = duration;
        }
        if let Some(size) = patch.max_group_size {
            next.max_group_size = size;
        }
        if let Some(difficulty) = patch.difficulty {
            next.difficulty = difficulty;
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(discount) = patch.price_discount {
            next.price_discount = Some(discount);
        }
        if let Some(summary) = patch.summary {
            next.summary = summary.trim().to_string();
        }
        if let Some(description) = patch.description {
            next.description = Some(description);
        }
        if let Some(cover) = patch.image_cover {
            next.image_cover = cover;
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(dates) = patch.start_dates {
            next.start_dates = dates;
        }
        validate_numbers(next.duration, next.max_group_size, next.price, next.price_discount)?;
        if next.summary.is_empty() {
            return Err(AppError::invalid("A tour must have a summary"));
        }
        *self = next;
        Ok(())
    }
}

/// Input for creating a tour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    pub name: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
}

impl NewTour {
    pub fn validate(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        validate_numbers(self.duration, self.max_group_size, self.price, self.price_discount)?;
        if self.summary.trim().is_empty() {
            return Err(AppError::invalid("A tour must have a summary"));
        }
        if self.image_cover.trim().is_empty() {
            return Err(AppError::invalid("A tour must have a cover image"));
        }
        Ok(())
    }
}

/// Partial update for a tour; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPatch {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
}

fn validate_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if !(10..=40).contains(&len) {
        return Err(AppError::invalid(
            "A tour name must have between 10 and 40 characters",
        ));
    }
    Ok(())
}

fn validate_numbers(
    duration: u32,
    max_group_size: u32,
    price: f64,
    discount: Option<f64>,
) -> AppResult<()> {
    if duration == 0 {
        return Err(AppError::invalid("A tour must have a duration"));
    }
    if max_group_size == 0 {
        return Err(AppError::invalid("A tour must have a group size"));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::invalid("A tour price must be positive"));
    }
    if let Some(discount) = discount {
        if !discount.is_finite() || discount < 0.0 || discount >= price {
            return Err(AppError::invalid(format!(
                "Discount price ({}) should be below regular price",
                discount
            )));
        }
    }
    Ok(())
}

/// Lower-case, dash-separated form of a name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Sort orders accepted by the tour listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourSort {
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
    #[default]
    Newest,
}

impl TourSort {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "price" => Ok(TourSort::PriceAsc),
            "-price" => Ok(TourSort::PriceDesc),
            "ratingsAverage" => Ok(TourSort::RatingAsc),
            "-ratingsAverage" => Ok(TourSort::RatingDesc),
            "-createdAt" => Ok(TourSort::Newest),
            other => Err(AppError::invalid(format!("Unsupported sort: {}", other))),
        }
    }
}

pub const MAX_PAGE_SIZE: u32 = 100;

/// Filter, sort and pagination for tour listing
#[derive(Debug, Clone, PartialEq)]
pub struct TourQuery {
    pub difficulty: Option<Difficulty>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: TourSort,
    pub page: u32,
    pub limit: u32,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            difficulty: None,
            min_price: None,
            max_price: None,
            sort: TourSort::default(),
            page: 1,
            limit: MAX_PAGE_SIZE,
        }
    }
}

impl TourQuery {
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn matches(&self, tour: &Tour) -> bool {
        self.difficulty.map_or(true, |d| d == tour.difficulty)
            && self.min_price.map_or(true, |p| tour.price >= p)
            && self.max_price.map_or(true, |p| tour.price <= p)
    }
}

/// Aggregated review statistics for a tour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub quantity: u32,
    pub average: f64,
}

impl RatingStats {
    /// Average rounded to one decimal; the default average when there are no ratings
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                quantity: 0,
                average: DEFAULT_RATINGS_AVERAGE,
            };
        }
        let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
        let average = f64::from(sum) / ratings.len() as f64;
        Self {
            quantity: ratings.len() as u32,
            average: (average * 10.0).round() / 10.0,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_tour(name: &str, price: f64) -> NewTour {
        NewTour {
            name: name.to_string(),
            duration: 5,
            max_group_size: 25,
            difficulty: Difficulty::Easy,
            price,
            price_discount: None,
            summary: "Breathtaking hike through the Canadian Banff National Park".to_string(),
            description: None,
            image_cover: "tour-1-cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::new_tour;
    use super::*;

    #[test]
    fn test_create_tour_defaults() {
        let tour = Tour::create(new_tour("The Forest Hiker", 397.0)).unwrap();
        assert_eq!(tour.slug, "the-forest-hiker");
        assert_eq!(tour.ratings_average, DEFAULT_RATINGS_AVERAGE);
        assert_eq!(tour.ratings_quantity, 0);
        assert_eq!(tour.id.len(), 32);
    }

    #[test]
    fn test_name_length_is_enforced() {
        assert!(Tour::create(new_tour("Short", 397.0)).is_err());
        assert!(Tour::create(new_tour(&"x".repeat(41), 397.0)).is_err());
    }

    #[test]
    fn test_discount_must_be_below_price() {
        let mut input = new_tour("The Sea Explorer", 497.0);
        input.price_discount = Some(497.0);
        assert!(Tour::create(input).is_err());
    }

    #[test]
    fn test_patch_revalidates() {
        let mut tour = Tour::create(new_tour("The Snow Adventurer", 997.0)).unwrap();
        let bad = TourPatch {
            price: Some(0.0),
            ..Default::default()
        };
        assert!(tour.apply(bad).is_err());
        assert_eq!(tour.price, 997.0);

        let good = TourPatch {
            name: Some("The Northern Lights".to_string()),
            price: Some(1497.0),
            ..Default::default()
        };
        tour.apply(good).unwrap();
        assert_eq!(tour.slug, "the-northern-lights");
        assert_eq!(tour.price, 1497.0);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  The Park  Camper! "), "the-park-camper");
    }

    #[test]
    fn test_query_matches_and_skip() {
        let tour = Tour::create(new_tour("The City Wanderer", 1197.0)).unwrap();
        let query = TourQuery {
            max_price: Some(1000.0),
            ..Default::default()
        };
        assert!(!query.matches(&tour));
        let query = TourQuery {
            difficulty: Some(Difficulty::Easy),
            min_price: Some(1000.0),
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert!(query.matches(&tour));
        assert_eq!(query.skip(), 20);
    }

    #[test]
    fn test_rating_stats() {
        let stats = RatingStats::from_ratings(&[5, 4, 4]);
        assert_eq!(stats.quantity, 3);
        assert_eq!(stats.average, 4.3);
        assert_eq!(RatingStats::from_ratings(&[]).average, DEFAULT_RATINGS_AVERAGE);
    }

    #[test]
    fn test_tour_serializes_with_wire_field_names() {
        let tour = Tour::create(new_tour("The Forest Hiker", 397.0)).unwrap();
        let json = serde_json::to_value(&tour).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("imageCover").is_some());
        assert!(json.get("maxGroupSize").is_some());
    }
}
