//! # Razorpay Configuration
//!
//! Configuration management for the Razorpay integration.
//! All secrets are loaded from environment variables.

use natours_core::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Key id (rzp_test_... or rzp_live_...), also handed to the browser
    pub key_id: String,

    /// Key secret. Authenticates API calls and signs checkout callbacks.
    pub key_secret: String,

    /// Webhook signing secret; webhooks are rejected when unset
    pub webhook_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RazorpayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `RAZORPAY_KEY_ID`
    /// - `RAZORPAY_KEY_SECRET`
    ///
    /// Optional: `RAZORPAY_WEBHOOK_SECRET`, `RAZORPAY_API_BASE_URL`
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let key_id = env::var("RAZORPAY_KEY_ID")
            .map_err(|_| AppError::Configuration("RAZORPAY_KEY_ID not set".to_string()))?;

        let key_secret = env::var("RAZORPAY_KEY_SECRET")
            .map_err(|_| AppError::Configuration("RAZORPAY_KEY_SECRET not set".to_string()))?;

        let webhook_secret = env::var("RAZORPAY_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let mut config = Self::new(key_id, key_secret);
        config.webhook_secret = webhook_secret;
        if let Ok(url) = env::var("RAZORPAY_API_BASE_URL") {
            config.api_base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            webhook_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Check key formats
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.is_test_mode() && !self.is_live_mode() {
            return Err(AppError::Configuration(
                "RAZORPAY_KEY_ID must start with rzp_test_ or rzp_live_".to_string(),
            ));
        }
        if self.key_secret.is_empty() {
            return Err(AppError::Configuration(
                "RAZORPAY_KEY_SECRET must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set the webhook signing secret
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[redacted]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
