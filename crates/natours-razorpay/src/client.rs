//! # Razorpay Gateway
//!
//! `PaymentGateway` implementation over the Razorpay REST API:
//! orders, payments and refunds, plus both signature checks.

use crate::config::RazorpayConfig;
use crate::signature;
use crate::webhook::parse_webhook_event;
use async_trait::async_trait;
use chrono::DateTime;
use natours_core::{
    AppError, AppResult, Currency, GatewayOrder, OrderNotes, OrderRequest, Payment,
    PaymentGateway, Refund, RefundRequest, WebhookEvent,
};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "razorpay";

/// Razorpay API client
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::new(RazorpayConfig::from_env()?)
    }

    pub fn config(&self) -> &RazorpayConfig {
        &self.config
    }

    /// API URL for `segments` under `/v1`, each pushed as one escaped segment.
    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Razorpay API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Razorpay API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.config.key_id, Some(&self.config.key_secret))
    }

    /// Send a request and decode the JSON body, mapping API errors.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, resource: &'static str, id: &str) -> AppResult<T> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Razorpay API error: status={}, body={}", status, body);
            return Err(api_error(status, &body, resource, id));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::Serialization(format!("Failed to parse Razorpay response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, request), fields(receipt = %request.receipt, amount = request.amount))]
    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder> {
        let body = CreateOrderBody {
            amount: request.amount,
            currency: request.currency.as_str(),
            receipt: &request.receipt,
            notes: &request.notes,
        };

        let order: RazorpayOrder = self
            .send(self.client.post(self.url(&["orders"])?).json(&body), "order", "")
            .await?;

        info!("Created Razorpay order: id={}, amount={}", order.id, order.amount);
        order.into_gateway_order()
    }

    #[instrument(skip(self))]
    async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder> {
        let order_id = checked_id("order", order_id)?;
        let order: RazorpayOrder = self
            .send(self.client.get(self.url(&["orders", order_id])?), "order", order_id)
            .await?;
        debug!("Fetched Razorpay order {} (status={})", order.id, order.status);
        order.into_gateway_order()
    }

    #[instrument(skip(self))]
    async fn fetch_payment(&self, payment_id: &str) -> AppResult<Payment> {
        let payment_id = checked_id("payment", payment_id)?;
        let payment: Payment = self
            .send(self.client.get(self.url(&["payments", payment_id])?), "payment", payment_id)
            .await?;

        let entity = payment.extra.get("entity").and_then(|v| v.as_str());
        if entity != Some("payment") {
            error!("Expected a payment entity for {}, got {:?}", payment_id, entity);
            return Err(AppError::Gateway {
                provider: PROVIDER.to_string(),
                message: format!("unexpected entity {:?} for payment {}", entity, payment_id),
            });
        }
        Ok(payment)
    }

    #[instrument(skip(self, request))]
    async fn refund_payment(&self, payment_id: &str, request: &RefundRequest) -> AppResult<Refund> {
        let payment_id = checked_id("payment", payment_id)?;
        self.send(
            self.client
                .post(self.url(&["payments", payment_id, "refund"])?)
                .json(request),
            "payment",
            payment_id,
        )
        .await
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature::verify_payment_signature(&self.config.key_secret, order_id, payment_id, signature)
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> AppResult<WebhookEvent> {
        let secret = self.config.webhook_secret.as_deref().ok_or_else(|| {
            AppError::Configuration("RAZORPAY_WEBHOOK_SECRET not set".to_string())
        })?;

        if !signature::verify_webhook_signature(secret, payload, signature) {
            return Err(AppError::VerificationFailed);
        }

        parse_webhook_event(payload)
    }

    fn public_key(&self) -> &str {
        &self.config.key_id
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-2xx Razorpay response to an error.
///
/// Razorpay answers unknown ids with 400 `BAD_REQUEST_ERROR` and a
/// "does not exist" description rather than a 404.
fn api_error(status: StatusCode, body: &str, resource: &'static str, id: &str) -> AppError {
    let parsed = serde_json::from_str::<RazorpayErrorResponse>(body).ok();
    let description = parsed
        .as_ref()
        .map(|e| e.error.description.clone())
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    if status == StatusCode::NOT_FOUND || description.contains("does not exist") {
        return AppError::not_found(resource, id);
    }
    if status == StatusCode::UNAUTHORIZED {
        return AppError::Gateway {
            provider: PROVIDER.to_string(),
            message: "authentication with Razorpay failed".to_string(),
        };
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::Network(format!("Razorpay unavailable: {}", description));
    }
    AppError::Gateway {
        provider: PROVIDER.to_string(),
        message: description,
    }
}

/// Razorpay ids look like `pay_29QQoUBi66xm2f`; anything else never reaches a URL.
fn checked_id<'a>(resource: &'static str, id: &'a str) -> AppResult<&'a str> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Ok(id)
    } else {
        Err(AppError::invalid(format!("Invalid {} id", resource)))
    }
}

/// Notes come back as an object, or as `[]` when empty.
pub(crate) fn order_notes(value: &serde_json::Value) -> Option<OrderNotes> {
    match value {
        serde_json::Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

// =============================================================================
// Razorpay API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a OrderNotes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl RazorpayOrder {
    pub(crate) fn into_gateway_order(self) -> AppResult<GatewayOrder> {
        let currency: Currency = self
            .currency
            .parse()
            .map_err(AppError::Serialization)?;

        Ok(GatewayOrder {
            notes: order_notes(&self.notes),
            id: self.id,
            amount: self.amount,
            currency,
            receipt: self.receipt,
            status: self.status,
            created_at: self.created_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayError,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    #[serde(default)]
    #[allow(dead_code)]
    code: Option<String>,
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use natours_core::RefundSpeed;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway(server: &MockServer) -> RazorpayGateway {
        let config = RazorpayConfig::new("rzp_test_key", "key_secret")
            .with_api_base_url(server.uri())
            .with_webhook_secret("hook_secret");
        RazorpayGateway::new(config).unwrap()
    }

    fn notes() -> OrderNotes {
        OrderNotes {
            tour_id: "t1".into(),
            user_id: "u1".into(),
            tour_name: "The Forest Hiker".into(),
        }
    }

    #[tokio::test]
    async fn test_create_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(header_exists("authorization"))
            .and(body_json(json!({
                "amount": 50000,
                "currency": "INR",
                "receipt": "tour_t1_1700000000000",
                "notes": {"tourId": "t1", "userId": "u1", "tourName": "The Forest Hiker"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "order_ABC",
                "entity": "order",
                "amount": 50000,
                "amount_paid": 0,
                "currency": "INR",
                "receipt": "tour_t1_1700000000000",
                "status": "created",
                "notes": {"tourId": "t1", "userId": "u1", "tourName": "The Forest Hiker"},
                "created_at": 1700000000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server).await;
        let order = gw
            .create_order(&OrderRequest {
                amount: 50000,
                currency: Currency::INR,
                receipt: "tour_t1_1700000000000".into(),
                notes: notes(),
            })
            .await
            .unwrap();

        assert_eq!(order.id, "order_ABC");
        assert_eq!(order.amount, 50000);
        assert_eq!(order.notes, Some(notes()));
        assert!(order.created_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_order_with_empty_notes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "order_X",
                "amount": 1000,
                "currency": "INR",
                "status": "paid",
                "notes": []
            })))
            .mount(&server)
            .await;

        let order = gateway(&server).await.fetch_order("order_X").await.unwrap();
        assert_eq!(order.status, "paid");
        assert!(order.notes.is_none());
    }

    #[tokio::test]
    async fn test_unknown_payment_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/pay_missing"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": "BAD_REQUEST_ERROR",
                    "description": "The id provided does not exist"
                }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .fetch_payment("pay_missing")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": "BAD_REQUEST_ERROR",
                    "description": "Order amount less than minimum amount allowed"
                }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .create_order(&OrderRequest {
                amount: 1,
                currency: Currency::INR,
                receipt: "r".into(),
                notes: notes(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert!(err.to_string().contains("minimum amount"));
    }

    #[tokio::test]
    async fn test_refund_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/pay_1/refund"))
            .and(body_json(json!({"speed": "normal"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "rfnd_1",
                "entity": "refund",
                "payment_id": "pay_1",
                "amount": 50000,
                "currency": "INR",
                "status": "processed",
                "speed_requested": "normal",
                "created_at": 1700000100
            })))
            .expect(1)
            .mount(&server)
            .await;

        let refund = gateway(&server)
            .await
            .refund_payment(
                "pay_1",
                &RefundRequest {
                    amount: None,
                    speed: RefundSpeed::Normal,
                },
            )
            .await
            .unwrap();
        assert_eq!(refund.id, "rfnd_1");
        assert_eq!(refund.amount, 50000);
        assert_eq!(refund.extra.get("entity").unwrap(), "refund");
    }

    #[tokio::test]
    async fn test_verify_payment_signature() {
        let server = MockServer::start().await;
        let gw = gateway(&server).await;
        let sig = signature::payment_signature("key_secret", "order_1", "pay_1");
        assert!(gw.verify_payment_signature("order_1", "pay_1", &sig));
        assert!(!gw.verify_payment_signature("order_1", "pay_1", "deadbeef"));
    }

    #[tokio::test]
    async fn test_webhook_requires_secret() {
        let gw = RazorpayGateway::new(RazorpayConfig::new("rzp_test_key", "key_secret")).unwrap();
        let err = gw.verify_webhook(b"{}", "sig").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_malformed_ids_never_reach_the_api() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entity": "collection"})))
            .expect(0)
            .mount(&server)
            .await;
        let gw = gateway(&server).await;

        for id in ["../payments", "..%2Fpayments", "pay_1/refund", "pay 1", ""] {
            let err = gw.fetch_payment(id).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "id {:?}", id);
            let err = gw.fetch_order(id).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "id {:?}", id);
            let err = gw
                .refund_payment(id, &RefundRequest::default())
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), 400, "id {:?}", id);
        }
    }

    #[test]
    fn test_url_segments_are_escaped() {
        let gw = RazorpayGateway::new(
            RazorpayConfig::new("rzp_test_key", "key_secret").with_api_base_url("http://localhost:9/"),
        )
        .unwrap();
        let url = gw.url(&["payments", "a/b?c", "refund"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9/v1/payments/a%2Fb%3Fc/refund");
    }

    #[tokio::test]
    async fn test_fetch_payment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/pay_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pay_1",
                "entity": "payment",
                "amount": 50000,
                "currency": "INR",
                "status": "captured",
                "order_id": "order_1",
                "method": "upi",
                "email": "buyer@example.com",
                "created_at": 1700000000
            })))
            .mount(&server)
            .await;

        let payment = gateway(&server).await.fetch_payment("pay_1").await.unwrap();
        assert_eq!(payment.order_id.as_deref(), Some("order_1"));
        assert_eq!(payment.method.as_deref(), Some("upi"));
    }

    #[tokio::test]
    async fn test_fetch_payment_rejects_other_entities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/pay_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pay_1",
                "entity": "refund",
                "amount": 50000,
                "currency": "INR",
                "status": "processed"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).await.fetch_payment("pay_1").await.unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_server_errors_are_network_errors() {
        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down", "order", "");
        assert_eq!(err.status_code(), 503);
    }
}
