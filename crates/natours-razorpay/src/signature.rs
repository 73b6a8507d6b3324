//! # Signatures
//!
//! Razorpay signs two things with HMAC-SHA256, hex encoded:
//! - the checkout callback: `orderId|paymentId` keyed with the API key secret
//! - webhook deliveries: the raw request body keyed with the webhook secret

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn compute_hmac_sha256(secret: &str, message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Expected signature for a checkout callback
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    compute_hmac_sha256(key_secret, format!("{}|{}", order_id, payment_id).as_bytes())
}

pub fn verify_payment_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let expected = payment_signature(key_secret, order_id, payment_id);
    constant_time_compare(&expected, signature.trim())
}

pub fn verify_webhook_signature(webhook_secret: &str, payload: &[u8], signature: &str) -> bool {
    let expected = compute_hmac_sha256(webhook_secret, payload);
    constant_time_compare(&expected, signature.trim())
}

/// Length leaks; content does not.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
