//! # Razorpay Webhook Handling
//!
//! Parsing of signed webhook deliveries. The signature is checked by
//! [`RazorpayGateway::verify_webhook`](crate::RazorpayGateway) before this
//! runs; here we only turn the body into a [`WebhookEvent`].
//!
//! Delivery shape:
//!
//! ```json
//! {
//!   "entity": "event",
//!   "event": "order.paid",
//!   "payload": {
//!     "payment": { "entity": { "id": "pay_..", "order_id": "order_..", "amount": 50000, ... } },
//!     "order":   { "entity": { "id": "order_..", "notes": { "tourId": .. }, ... } }
//!   },
//!   "created_at": 1700000000
//! }
//! ```

use crate::client::order_notes;
use chrono::{DateTime, Utc};
use natours_core::{AppError, AppResult, WebhookEvent, WebhookEventKind};
use serde::Deserialize;
use serde_json::Value;

/// Events that should be enabled in the Razorpay dashboard
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "order.paid",
    "payment.captured",
    "payment.failed",
    "refund.processed",
];

#[derive(Debug, Deserialize)]
struct RazorpayWebhook {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    payment: Option<EntityWrapper>,
    #[serde(default)]
    order: Option<EntityWrapper>,
}

#[derive(Debug, Deserialize)]
struct EntityWrapper {
    entity: Value,
}

fn kind_of(event: &str) -> WebhookEventKind {
    match event {
        "order.paid" => WebhookEventKind::OrderPaid,
        "payment.captured" => WebhookEventKind::PaymentCaptured,
        "payment.failed" => WebhookEventKind::PaymentFailed,
        "refund.processed" => WebhookEventKind::RefundProcessed,
        other => WebhookEventKind::Unknown(other.to_string()),
    }
}

/// Parse a verified webhook body
pub fn parse_webhook_event(payload: &[u8]) -> AppResult<WebhookEvent> {
    let hook: RazorpayWebhook = serde_json::from_slice(payload)
        .map_err(|e| AppError::invalid(format!("Failed to parse webhook: {}", e)))?;

    let payment = hook.payload.payment.as_ref().map(|w| &w.entity);
    let order = hook.payload.order.as_ref().map(|w| &w.entity);

    let str_field = |entity: Option<&Value>, key: &str| {
        entity
            .and_then(|e| e.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    let payment_id = str_field(payment, "id");
    let order_id = str_field(payment, "order_id").or_else(|| str_field(order, "id"));

    let amount = payment
        .and_then(|p| p.get("amount"))
        .or_else(|| order.and_then(|o| o.get("amount_paid")))
        .and_then(|v| v.as_i64());

    let currency = str_field(payment, "currency")
        .or_else(|| str_field(order, "currency"))
        .and_then(|c| c.parse().ok());

    // Payment notes are set by the checkout client and never read.
    let notes = order.and_then(|o| o.get("notes")).and_then(order_notes);

    let timestamp = hook
        .created_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(WebhookEvent {
        kind: kind_of(&hook.event),
        provider: "razorpay".to_string(),
        order_id,
        payment_id,
        amount,
        currency,
        notes,
        timestamp,
    })
}
