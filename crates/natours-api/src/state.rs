//! # Application State
//!
//! Shared state for the Axum application: configuration, the store, the
//! checkout flow and the token keys. Built once at startup.

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use anyhow::Context;
use natours_core::{
    load_tour_seed, BoxedPaymentGateway, Checkout, MemoryStore, PaymentGateway, SharedStore,
};
use natours_mongo::MongoStore;
use natours_razorpay::RazorpayGateway;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SharedStore,
    pub gateway: BoxedPaymentGateway,
    pub checkout: Checkout,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Assemble state from already-built parts
    pub fn new(config: AppConfig, store: SharedStore, gateway: BoxedPaymentGateway) -> Self {
        let checkout = Checkout::new(store.clone(), gateway.clone(), config.currency);
        let jwt = JwtKeys::new(&config.auth.jwt_secret, config.auth.token_lifetime);
        Self {
            config: Arc::new(config),
            store,
            gateway,
            checkout,
            jwt: Arc::new(jwt),
        }
    }

    /// Connect the store and the gateway described by `config`
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: SharedStore = match &config.database {
            Some(db) => Arc::new(
                MongoStore::connect(&db.uri, &db.name)
                    .await
                    .context("Failed to connect to MongoDB")?,
            ),
            None => {
                warn!("DATABASE not set, using the in-memory store");
                Arc::new(memory_store(config.tours_seed_file.as_deref())?)
            }
        };

        let gateway = RazorpayGateway::new(config.razorpay.clone())
            .context("Failed to initialize Razorpay")?;
        info!(
            "Payment provider: {} ({} mode)",
            gateway.provider_name(),
            if gateway.config().is_live_mode() { "live" } else { "test" }
        );
        if gateway.config().webhook_secret.is_none() {
            warn!("RAZORPAY_WEBHOOK_SECRET not set, /webhook-checkout will reject deliveries");
        }

        Ok(Self::new(config, store, Arc::new(gateway)))
    }
}

/// In-memory store, seeded with tours when a seed file is configured
fn memory_store(seed_file: Option<&Path>) -> anyhow::Result<MemoryStore> {
    let Some(path) = seed_file else {
        return Ok(MemoryStore::new());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tours = load_tour_seed(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!("Loaded {} tours from {}", tours.len(), path.display());
    Ok(MemoryStore::with_tours(tours))
}
