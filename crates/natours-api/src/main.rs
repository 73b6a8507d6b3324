//! # Natours
//!
//! Tour booking backend with Razorpay checkout.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export JWT_SECRET=...               # at least 32 bytes
//! export RAZORPAY_KEY_ID=rzp_test_...
//! export RAZORPAY_KEY_SECRET=...
//! export RAZORPAY_WEBHOOK_SECRET=...
//! export DATABASE=mongodb+srv://natours:<password>@cluster0.example.net/natours
//! export DATABASE_PASSWORD=...
//!
//! # Run the server
//! natours
//! ```

use natours_api::{routes, AppConfig, AppState};
use std::net::SocketAddr;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let is_prod = config.is_production();

    // Initialize logging: JSON lines in production, human-readable otherwise
    tracing_subscriber::registry()
        .with(is_prod.then(|| fmt::layer().json()))
        .with((!is_prod).then(fmt::layer))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    if !is_prod {
        print_banner();
    }

    let addr = config.socket_addr();
    info!("Environment: {}", config.environment);
    info!("Currency: {}", config.currency);

    // Initialize application state
    let state = AppState::from_config(config).await?;

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Natours starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Create order: POST http://{}/api/v1/razorpay/create-order/{{tourId}}", addr);
        info!("Webhook: POST http://{}/webhook-checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Natours
  ━━━━━━━━━━━━━━━━━━━━━━━
  Tours booking API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
