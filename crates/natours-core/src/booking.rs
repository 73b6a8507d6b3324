//! # Booking Types
//!
//! A booking is written once, after a payment has been verified, and never
//! updated. Its tour and user references always come from the gateway
//! order's notes.

use crate::error::{AppError, AppResult};
use crate::payment::{Currency, OrderNotes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub tour: String,
    pub user: String,
    /// Major currency unit
    pub price: f64,
    pub payment_id: String,
    pub order_id: String,
    #[serde(default = "default_paid")]
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

fn default_paid() -> bool {
    true
}

/// Payment facts that have already passed signature verification
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub order_id: String,
    pub payment_id: String,
    /// Minor units, as reported by the gateway
    pub amount: i64,
    pub currency: Currency,
    pub notes: Option<OrderNotes>,
}

impl Booking {
    pub fn from_verified(payment: &VerifiedPayment) -> AppResult<Self> {
        let notes = payment.notes.as_ref().ok_or_else(|| AppError::Gateway {
            provider: "razorpay".to_string(),
            message: format!("order {} carries no booking notes", payment.order_id),
        })?;

        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            tour: notes.tour_id.clone(),
            user: notes.user_id.clone(),
            price: payment.currency.from_minor_units(payment.amount),
            payment_id: payment.payment_id.clone(),
            order_id: payment.order_id.clone(),
            paid: true,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_from_verified_payment() {
        let payment = VerifiedPayment {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            amount: 50000,
            currency: Currency::INR,
            notes: Some(OrderNotes {
                tour_id: "tour_a".into(),
                user_id: "user_b".into(),
                tour_name: "The Forest Hiker".into(),
            }),
        };
        let booking = Booking::from_verified(&payment).unwrap();
        assert_eq!(booking.price, 500.0);
        assert_eq!(booking.tour, "tour_a");
        assert_eq!(booking.user, "user_b");
        assert!(booking.paid);
    }

    #[test]
    fn test_booking_requires_notes() {
        let payment = VerifiedPayment {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            amount: 50000,
            currency: Currency::INR,
            notes: None,
        };
        let err = Booking::from_verified(&payment).unwrap_err();
        assert_eq!(err.status_code(), 502);
    }
}
