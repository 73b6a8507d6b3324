//! Query documents built from store filters.

use mongodb::bson::{doc, Document};
use natours_core::{BookingFilter, TourQuery, TourSort};

pub fn tour_filter(query: &TourQuery) -> Document {
    let mut filter = Document::new();
    if let Some(difficulty) = query.difficulty {
        filter.insert("difficulty", difficulty.as_str());
    }

    let mut price = Document::new();
    if let Some(min) = query.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = query.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        filter.insert("price", price);
    }
    filter
}

pub fn tour_sort(sort: TourSort) -> Document {
    match sort {
        TourSort::PriceAsc => doc! { "price": 1 },
        TourSort::PriceDesc => doc! { "price": -1 },
        TourSort::RatingAsc => doc! { "ratingsAverage": 1 },
        TourSort::RatingDesc => doc! { "ratingsAverage": -1 },
        TourSort::Newest => doc! { "createdAt": -1 },
    }
}

pub fn booking_filter(filter: &BookingFilter) -> Document {
    let mut doc = Document::new();
    if let Some(user) = &filter.user {
        doc.insert("user", user.as_str());
    }
    if let Some(tour) = &filter.tour {
        doc.insert("tour", tour.as_str());
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use natours_core::Difficulty;

    #[test]
    fn test_empty_query_matches_everything() {
        assert_eq!(tour_filter(&TourQuery::default()), doc! {});
        assert_eq!(tour_sort(TourSort::default()), doc! { "createdAt": -1 });
    }

    #[test]
    fn test_tour_filter_with_price_range() {
        let query = TourQuery {
            difficulty: Some(Difficulty::Medium),
            min_price: Some(300.0),
            max_price: Some(1000.0),
            ..Default::default()
        };
        assert_eq!(
            tour_filter(&query),
            doc! {
                "difficulty": "medium",
                "price": { "$gte": 300.0, "$lte": 1000.0 },
            }
        );
    }

    #[test]
    fn test_booking_filter() {
        let filter = BookingFilter {
            user: Some("u1".into()),
            tour: None,
        };
        assert_eq!(booking_filter(&filter), doc! { "user": "u1" });
    }
}
