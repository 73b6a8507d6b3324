//! Razorpay checkout endpoints and the webhook receiver.

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use natours_core::{AppError, PaymentConfirmation, WebhookOutcome};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Optional refund body; amount in minor units
#[derive(Debug, Default, Deserialize)]
pub struct RefundBody {
    #[serde(default)]
    pub amount: Option<i64>,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tour_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = state.checkout.create_order(&user, &tour_id).await?;
    Ok(Json(json!({ "status": "success", "order": order })))
}

#[instrument(skip_all)]
pub async fn verify_payment(
    State(state): State<AppState>,
    ApiJson(confirmation): ApiJson<PaymentConfirmation>,
) -> ApiResult<Json<Value>> {
    let booking = state.checkout.verify_payment(&confirmation).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Payment verified successfully",
        "booking": booking,
    })))
}

#[instrument(skip(state))]
pub async fn payment_details(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let payment = state.checkout.payment_details(&payment_id).await?;
    Ok(Json(json!({ "status": "success", "payment": payment })))
}

#[instrument(skip(state, body))]
pub async fn refund(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    body: Option<Json<RefundBody>>,
) -> ApiResult<Json<Value>> {
    let amount = body.and_then(|Json(b)| b.amount);
    let refund = state.checkout.refund(&payment_id, amount).await?;
    Ok(Json(json!({ "status": "success", "refund": refund })))
}

/// Razorpay webhook receiver. The body is taken raw so the signature is
/// checked over the exact bytes that were signed.
#[instrument(skip_all)]
pub async fn webhook_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    if state.config.razorpay.webhook_secret.is_none() {
        return Err(AppError::Configuration("webhook secret not configured".to_string()).into());
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::invalid("Missing X-Razorpay-Signature header"))?;

    match state.checkout.handle_webhook(&body, signature).await? {
        WebhookOutcome::Booked(booking) => {
            info!("Webhook booking {} for payment {}", booking.id, booking.payment_id)
        }
        WebhookOutcome::Ignored(kind) => debug!("Webhook event {:?} acknowledged", kind),
    }

    Ok(Json(json!({ "received": true })))
}
