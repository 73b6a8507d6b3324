//! # Payment Gateway Trait
//!
//! Seam between the checkout flow and a hosted payment provider.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentGateway (trait)                    │
//! │  ├── create_order() / fetch_order()                         │
//! │  ├── fetch_payment() / refund_payment()                     │
//! │  ├── verify_payment_signature()                             │
//! │  └── verify_webhook()                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                 ┌──────────┴──────────┐
//!         ┌───────┴───────┐     ┌───────┴───────┐
//!         │RazorpayGateway│     │  test doubles │
//!         └───────────────┘     └───────────────┘
//! ```
//!
//! The gateway is built once from configuration and shared through
//! application state; nothing here is a process-wide singleton.

use crate::error::AppResult;
use crate::payment::{GatewayOrder, OrderRequest, Payment, Refund, RefundRequest, WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order the client will pay against.
    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder>;

    /// Fetch an order, including the notes we attached at creation.
    async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder>;

    async fn fetch_payment(&self, payment_id: &str) -> AppResult<Payment>;

    async fn refund_payment(&self, payment_id: &str, request: &RefundRequest) -> AppResult<Refund>;

    /// Check the signature the checkout widget hands back to the client.
    ///
    /// Returns `false` on mismatch; never errors.
    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Verify a webhook body against its signature header and parse it.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> AppResult<WebhookEvent>;

    /// Public key id handed to the client-side checkout widget.
    fn public_key(&self) -> &str;

    /// Provider name (for logging and error messages).
    fn provider_name(&self) -> &'static str;
}

/// Shared gateway handle (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;
