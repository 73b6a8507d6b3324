//! # Payment Types
//!
//! Currency handling plus the gateway-side order, payment and refund shapes.
//! Gateway amounts are always in the smallest currency unit (paise for INR).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Number of decimal places in the major unit
    pub fn decimal_places(&self) -> u8 {
        2
    }

    /// Convert a major-unit amount to the smallest currency unit
    pub fn to_minor_units(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from the smallest unit back to the major unit
    pub fn from_minor_units(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INR" => Ok(Currency::INR),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            other => Err(format!("Unsupported currency: {}", other)),
        }
    }
}

/// Reconciliation data attached to every order we create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    pub tour_id: String,
    pub user_id: String,
    pub tour_name: String,
}

/// Gateway receipts are capped at this many characters
pub const MAX_RECEIPT_LEN: usize = 40;

/// Receipt of the form `tour_<tourId>_<millis>`.
///
/// The timestamp is kept whole; the tour id is truncated when the result
/// would exceed [`MAX_RECEIPT_LEN`].
pub fn receipt_for(tour_id: &str, at: DateTime<Utc>) -> String {
    let stamp = at.timestamp_millis().to_string();
    let budget = MAX_RECEIPT_LEN.saturating_sub("tour_".len() + 1 + stamp.len());
    let id: String = tour_id.chars().take(budget).collect();
    format!("tour_{}_{}", id, stamp)
}

/// Request to create a gateway order
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Minor units
    pub amount: i64,
    pub currency: Currency,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// An order as held by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor units
    pub amount: i64,
    pub currency: Currency,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    /// Missing when the order was not created by this service
    #[serde(default)]
    pub notes: Option<OrderNotes>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A payment as held by the gateway. Unmodelled provider fields are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Refund processing speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundSpeed {
    #[default]
    Normal,
    Optimum,
}

/// Refund request; `amount: None` refunds the full payment
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    pub speed: RefundSpeed,
}

/// A refund as held by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub speed_requested: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Webhook event kinds we act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    OrderPaid,
    PaymentCaptured,
    PaymentFailed,
    RefundProcessed,
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub kind: WebhookEventKind,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Minor units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<OrderNotes>,
    pub timestamp: DateTime<Utc>,
}
