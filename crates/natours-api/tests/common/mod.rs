#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Duration;
use natours_api::auth::hash_password;
use natours_api::config::{AppConfig, AuthConfig};
use natours_api::{create_router, AppState};
use natours_core::{
    BookingFilter, BookingStore, Currency, Difficulty, MemoryStore, NewTour, Role, SharedStore,
    Tour, TourStore, User, UserStore,
};
use natours_razorpay::{RazorpayConfig, RazorpayGateway};
use std::sync::{Arc, OnceLock};
use wiremock::MockServer;

pub const KEY_ID: &str = "rzp_test_natours";
pub const KEY_SECRET: &str = "razorpay_key_secret";
pub const WEBHOOK_SECRET: &str = "razorpay_webhook_secret";
pub const PASSWORD: &str = "pass1234";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub razorpay: MockServer,
}

pub fn test_config(razorpay: RazorpayConfig) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        environment: "test".to_string(),
        database: None,
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-0123456789abcdef".to_string(),
            token_lifetime: Duration::days(90),
        },
        razorpay,
        currency: Currency::INR,
        cors_origins: vec!["http://localhost:5173".to_string()],
        rate_limit_per_hour: 0,
        trust_proxy: false,
        tours_seed_file: None,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|config| config).await
}

pub async fn spawn_app_with(customize: impl FnOnce(AppConfig) -> AppConfig) -> TestApp {
    let razorpay = MockServer::start().await;
    let gateway_config = RazorpayConfig::new(KEY_ID, KEY_SECRET)
        .with_api_base_url(razorpay.uri())
        .with_webhook_secret(WEBHOOK_SECRET);
    let config = customize(test_config(gateway_config));

    let store: SharedStore = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RazorpayGateway::new(config.razorpay.clone()).unwrap());
    let state = AppState::new(config, store, gateway);
    let server = TestServer::new(create_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        razorpay,
    }
}

impl TestApp {
    pub async fn add_tour(&self, name: &str, price: f64) -> Tour {
        let tour = Tour::create(NewTour {
            name: name.to_string(),
            duration: 5,
            max_group_size: 25,
            difficulty: Difficulty::Easy,
            price,
            price_discount: None,
            summary: "Breathtaking hike through the Canadian Banff National Park".to_string(),
            description: None,
            image_cover: "tour-1-cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
        })
        .unwrap();
        self.state.store.insert_tour(tour).await.unwrap()
    }

    /// Insert a user with `PASSWORD` and return it with a bearer token
    pub async fn add_user(&self, email: &str, role: Role) -> (User, String) {
        let user = User::new("Test User", email, password_hash())
            .unwrap()
            .with_role(role);
        let user = self.state.store.insert_user(user).await.unwrap();
        let token = self.state.jwt.sign(&user).unwrap();
        (user, token)
    }

    pub async fn booking_count(&self) -> usize {
        self.state
            .store
            .list_bookings(&BookingFilter::default())
            .await
            .unwrap()
            .len()
    }
}

/// Hash of `PASSWORD`, computed once per test binary
pub fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

pub fn header(name: &'static str, value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap(),
    )
}
