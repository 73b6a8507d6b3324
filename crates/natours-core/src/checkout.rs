//! # Checkout Flow
//!
//! Order creation, payment verification and webhook reconciliation.
//!
//! ```text
//! client ──create_order──▶ Checkout ──▶ TourStore (price, name)
//!                                  └──▶ PaymentGateway::create_order (notes: tour/user)
//! client ──verify_payment─▶ Checkout ──▶ verify_payment_signature (HMAC)
//!                                  ├──▶ PaymentGateway::fetch_order (trusted notes)
//!                                  └──▶ BookingStore::insert_booking
//! gateway ─webhook────────▶ Checkout ──▶ verify_webhook
//!                                  ├──▶ PaymentGateway::fetch_order (trusted notes)
//!                                  └──▶ BookingStore::insert_booking
//! ```
//!
//! A booking is only ever written from gateway-held data after a signature
//! check has passed. Recording the same payment twice returns the existing
//! booking.

use crate::booking::{Booking, VerifiedPayment};
use crate::error::{AppError, AppResult};
use crate::gateway::BoxedPaymentGateway;
use crate::payment::{
    receipt_for, Currency, OrderNotes, OrderRequest, Payment, Refund, RefundRequest,
    RefundSpeed, WebhookEventKind,
};
use crate::store::SharedStore;
use crate::user::User;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Callback fields posted by the client after the checkout widget completes
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

/// Tour summary shown in the checkout widget
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTour {
    pub name: String,
    pub price: f64,
    pub image_cover: String,
}

/// Customer summary used to prefill the checkout widget
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutCustomer {
    pub name: String,
    pub email: String,
}

/// Everything the client needs to open the checkout widget
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOrder {
    pub id: String,
    /// Minor units
    pub amount: i64,
    pub currency: Currency,
    pub key: String,
    pub tour: CheckoutTour,
    pub user: CheckoutCustomer,
}

/// Result of processing a verified webhook
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Booked(Booking),
    Ignored(WebhookEventKind),
}

/// Checkout orchestration over a store and a gateway
#[derive(Clone)]
pub struct Checkout {
    store: SharedStore,
    gateway: BoxedPaymentGateway,
    currency: Currency,
}

impl Checkout {
    pub fn new(store: SharedStore, gateway: BoxedPaymentGateway, currency: Currency) -> Self {
        Self {
            store,
            gateway,
            currency,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Create a gateway order for one tour on behalf of `user`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_order(&self, user: &User, tour_id: &str) -> AppResult<CheckoutOrder> {
        let tour = self
            .store
            .find_tour(tour_id)
            .await?
            .ok_or_else(|| AppError::not_found("tour", tour_id))?;

        let request = OrderRequest {
            amount: self.currency.to_minor_units(tour.price),
            currency: self.currency,
            receipt: receipt_for(&tour.id, Utc::now()),
            notes: OrderNotes {
                tour_id: tour.id.clone(),
                user_id: user.id.clone(),
                tour_name: tour.name.clone(),
            },
        };

        debug!(
            "Creating order: tour={}, amount={}, receipt={}",
            tour.id, request.amount, request.receipt
        );

        let order = self.gateway.create_order(&request).await?;

        info!("Created order {} for tour {}", order.id, tour.id);

        Ok(CheckoutOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            key: self.gateway.public_key().to_string(),
            tour: CheckoutTour {
                name: tour.name,
                price: tour.price,
                image_cover: tour.image_cover,
            },
            user: CheckoutCustomer {
                name: user.name.clone(),
                email: user.email.clone(),
            },
        })
    }

    /// Verify a client-posted payment confirmation and record the booking.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.razorpay_order_id))]
    pub async fn verify_payment(&self, confirmation: &PaymentConfirmation) -> AppResult<Booking> {
        let PaymentConfirmation {
            razorpay_order_id: order_id,
            razorpay_payment_id: payment_id,
            razorpay_signature: signature,
        } = confirmation;

        if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return Err(AppError::invalid(
                "razorpay_order_id, razorpay_payment_id and razorpay_signature are required",
            ));
        }

        if !self
            .gateway
            .verify_payment_signature(order_id, payment_id, signature)
        {
            warn!("Signature mismatch for order {}", order_id);
            return Err(AppError::VerificationFailed);
        }

        let order = self.gateway.fetch_order(order_id).await?;

        self.record(VerifiedPayment {
            order_id: order.id,
            payment_id: payment_id.clone(),
            amount: order.amount,
            currency: order.currency,
            notes: order.notes,
        })
        .await
    }

    /// Verify a raw webhook delivery and book paid orders.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> AppResult<WebhookOutcome> {
        let event = self.gateway.verify_webhook(payload, signature)?;

        info!(
            "Received webhook: kind={:?}, order={:?}, payment={:?}",
            event.kind, event.order_id, event.payment_id
        );

        match event.kind {
            WebhookEventKind::OrderPaid | WebhookEventKind::PaymentCaptured => {
                let (Some(order_id), Some(payment_id)) = (event.order_id, event.payment_id) else {
                    debug!("Paid event without order or payment id, nothing to book");
                    return Ok(WebhookOutcome::Ignored(event.kind));
                };

                // Payment notes are writable by the checkout client; only the
                // order we created carries trusted tour and user ids.
                let order = self.gateway.fetch_order(&order_id).await?;
                if order.notes.is_none() {
                    debug!("Order {} has no booking notes, nothing to book", order.id);
                    return Ok(WebhookOutcome::Ignored(event.kind));
                }

                self.record(VerifiedPayment {
                    order_id: order.id,
                    payment_id,
                    amount: order.amount,
                    currency: order.currency,
                    notes: order.notes,
                })
                .await
                .map(WebhookOutcome::Booked)
            }
            other => Ok(WebhookOutcome::Ignored(other)),
        }
    }

    pub async fn payment_details(&self, payment_id: &str) -> AppResult<Payment> {
        self.gateway.fetch_payment(payment_id).await
    }

    /// Refund a payment. `amount` is in minor units; `None` refunds in full.
    ///
    /// Bookings are not touched.
    #[instrument(skip(self))]
    pub async fn refund(&self, payment_id: &str, amount: Option<i64>) -> AppResult<Refund> {
        if matches!(amount, Some(a) if a <= 0) {
            return Err(AppError::invalid("Refund amount must be positive"));
        }
        let request = RefundRequest {
            amount,
            speed: RefundSpeed::Normal,
        };
        let refund = self.gateway.refund_payment(payment_id, &request).await?;
        info!(
            "Refund {} issued for payment {} ({} {})",
            refund.id, payment_id, refund.amount, refund.currency
        );
        Ok(refund)
    }

    /// Persist a booking for a verified payment, returning the existing one on replay.
    async fn record(&self, payment: VerifiedPayment) -> AppResult<Booking> {
        if let Some(existing) = self.store.find_booking_by_payment(&payment.payment_id).await? {
            debug!("Payment {} already booked as {}", payment.payment_id, existing.id);
            return Ok(existing);
        }

        let booking = Booking::from_verified(&payment)?;
        match self.store.insert_booking(booking).await {
            Ok(booking) => {
                info!(
                    "Booked tour {} for user {} (payment {})",
                    booking.tour, booking.user, booking.payment_id
                );
                Ok(booking)
            }
            // Lost a race with a concurrent verification or webhook for the same payment.
            Err(AppError::Conflict(_)) => self
                .store
                .find_booking_by_payment(&payment.payment_id)
                .await?
                .ok_or_else(|| AppError::Internal("booking conflict without a booking".into())),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Gateway double that keeps orders in memory and signs with a toy scheme.

    use super::*;
    use crate::gateway::PaymentGateway;
    use crate::payment::{GatewayOrder, WebhookEvent};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct StubGateway {
        pub orders: Mutex<Vec<GatewayOrder>>,
        pub events: Mutex<Vec<WebhookEvent>>,
        pub fetch_calls: AtomicUsize,
        pub refund_calls: AtomicUsize,
    }

    impl StubGateway {
        pub fn sign(order_id: &str, payment_id: &str) -> String {
            format!("sig:{}|{}", order_id, payment_id)
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder> {
            let mut orders = self.orders.lock().unwrap();
            let order = GatewayOrder {
                id: format!("order_{}", orders.len() + 1),
                amount: request.amount,
                currency: request.currency,
                receipt: Some(request.receipt.clone()),
                status: "created".into(),
                notes: Some(request.notes.clone()),
                created_at: Some(Utc::now()),
            };
            orders.push(order.clone());
            Ok(order)
        }

        async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == order_id)
                .cloned()
                .ok_or_else(|| AppError::not_found("order", order_id))
        }

        async fn fetch_payment(&self, payment_id: &str) -> AppResult<Payment> {
            Err(AppError::not_found("payment", payment_id))
        }

        async fn refund_payment(&self, payment_id: &str, request: &RefundRequest) -> AppResult<Refund> {
            self.refund_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Refund {
                id: "rfnd_1".into(),
                payment_id: payment_id.into(),
                amount: request.amount.unwrap_or(50000),
                currency: "INR".into(),
                status: "processed".into(),
                speed_requested: Some("normal".into()),
                created_at: None,
                extra: Default::default(),
            })
        }

        fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
            Self::sign(order_id, payment_id) == signature
        }

        fn verify_webhook(&self, _payload: &[u8], signature: &str) -> AppResult<WebhookEvent> {
            if signature != "valid" {
                return Err(AppError::VerificationFailed);
            }
            self.events
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::invalid("no event queued"))
        }

        fn public_key(&self) -> &str {
            "rzp_test_stub"
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }
}
