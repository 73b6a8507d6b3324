//! # Application Configuration
//!
//! Everything is read once at startup from the environment (`.env` honoured)
//! and validated into typed structs.

use anyhow::{bail, Context};
use chrono::Duration;
use natours_core::Currency;
use natours_razorpay::RazorpayConfig;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Origins always allowed by CORS, in addition to `FRONTEND_URL`
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "https://natours-frontend-rhey.onrender.com",
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
];

pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEFAULT_SEED_FILE: &str = "config/tours.toml";

/// MongoDB connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    /// Used when the URI names no database
    pub name: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("uri", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// Bearer token settings
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_lifetime: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_lifetime_days", &self.token_lifetime.num_days())
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, production)
    pub environment: String,
    /// `None` runs on the in-memory store
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub razorpay: RazorpayConfig,
    pub currency: Currency,
    pub cors_origins: Vec<String>,
    /// Requests per IP per hour on `/api`; 0 disables limiting
    pub rate_limit_per_hour: u32,
    /// Read the client address from `X-Forwarded-For` (set when behind a reverse proxy)
    pub trust_proxy: bool,
    /// TOML file seeding the in-memory store
    pub tours_seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let host: IpAddr = host
            .parse()
            .with_context(|| format!("HOST is not an IP address: {}", host))?;
        let port = parse_var("PORT", 3000)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let database = match env::var("DATABASE").ok().filter(|s| !s.is_empty()) {
            Some(template) => {
                let password = env::var("DATABASE_PASSWORD").ok();
                Some(DatabaseConfig {
                    uri: database_uri(&template, password.as_deref())?,
                    name: env::var("DATABASE_NAME").unwrap_or_else(|_| "natours".to_string()),
                })
            }
            None => None,
        };

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;
        let auth = AuthConfig {
            jwt_secret,
            token_lifetime: Duration::days(parse_var("JWT_EXPIRES_IN_DAYS", 90)?),
        };

        let razorpay = RazorpayConfig::from_env()?;

        let currency = match env::var("PAYMENT_CURRENCY") {
            Ok(code) => code
                .parse()
                .map_err(|e| anyhow::anyhow!("PAYMENT_CURRENCY: {}", e))?,
            Err(_) => Currency::default(),
        };

        let mut cors_origins: Vec<String> =
            DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect();
        if let Ok(frontend) = env::var("FRONTEND_URL") {
            let frontend = frontend.trim_end_matches('/').to_string();
            if !frontend.is_empty() && !cors_origins.contains(&frontend) {
                cors_origins.push(frontend);
            }
        }

        let tours_seed_file = match env::var("TOURS_SEED_FILE") {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from(DEFAULT_SEED_FILE)).filter(|p| p.exists()),
        };

        let config = Self {
            host,
            port,
            environment,
            database,
            auth,
            razorpay,
            currency,
            cors_origins,
            rate_limit_per_hour: parse_var("RATE_LIMIT_MAX", 100)?,
            trust_proxy: parse_var("TRUST_PROXY", false)?,
            tours_seed_file,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET must be at least {} bytes", MIN_JWT_SECRET_LEN);
        }
        if self.auth.token_lifetime <= Duration::zero() {
            bail!("JWT_EXPIRES_IN_DAYS must be positive");
        }
        self.razorpay.validate()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} is invalid: {}", name, value)),
        Err(_) => Ok(default),
    }
}

/// Fill the `<password>` placeholder of a connection string
pub fn database_uri(template: &str, password: Option<&str>) -> anyhow::Result<String> {
    if !template.contains("<password>") {
        return Ok(template.to_string());
    }
    match password {
        Some(password) => Ok(template.replace("<password>", password)),
        None => bail!("DATABASE contains <password> but DATABASE_PASSWORD is not set"),
    }
}
