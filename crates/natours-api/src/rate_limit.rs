//! Per-IP rate limiting for the `/api` routes.
//!
//! Keys are dropped again once their quota has fully replenished; the table
//! is pruned every [`PRUNE_EVERY`] checks.

use crate::error::json_error;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again in an hour!";

pub const PRUNE_EVERY: u64 = 1024;

/// Keyed limiter shared by all requests
#[derive(Clone)]
pub struct RateLimitState<C: Clock = DefaultClock> {
    limiter: Arc<RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<C::Instant>>>,
    checks: Arc<AtomicU64>,
    trust_proxy: bool,
}

impl RateLimitState {
    /// `None` when `per_hour` is 0 (limiting disabled)
    pub fn per_hour(per_hour: u32, trust_proxy: bool) -> Option<Self> {
        let quota = Quota::per_hour(NonZeroU32::new(per_hour)?);
        Some(Self::with_clock(quota, trust_proxy, DefaultClock::default()))
    }
}

impl<C: Clock> RateLimitState<C> {
    fn with_clock(quota: Quota, trust_proxy: bool, clock: C) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock)),
            checks: Arc::new(AtomicU64::new(0)),
            trust_proxy,
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }
        self.limiter.check_key(&ip).is_ok()
    }

    /// Forget clients whose quota is back to full.
    pub fn prune(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!("Rate limiter pruned: {} -> {} clients", before, self.limiter.len());
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy
    }
}

/// Client address used as the limiter key.
///
/// Without a trusted proxy this is always the peer. Behind one, the proxy
/// appends the address it saw as the last `X-Forwarded-For` hop; earlier
/// hops are client-supplied and ignored.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> IpAddr {
    let peer_ip = peer
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    if !trust_proxy {
        return peer_ip;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .and_then(|v| v.trim().parse().ok());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    forwarded.or_else(real_ip).unwrap_or(peer_ip)
}

pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer, rate_limit.trust_proxy());

    if !rate_limit.check(ip) {
        warn!("Rate limit exceeded for {}", ip);
        return json_error(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use governor::clock::FakeRelativeClock;
    use std::time::Duration;

    fn fake_clock_state(per_hour: u32) -> (RateLimitState<FakeRelativeClock>, FakeRelativeClock) {
        let clock = FakeRelativeClock::default();
        let quota = Quota::per_hour(NonZeroU32::new(per_hour).unwrap());
        (RateLimitState::with_clock(quota, false, clock.clone()), clock)
    }

    fn nth_ip(n: u32) -> IpAddr {
        IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + n))
    }

    #[test]
    fn test_disabled_at_zero() {
        assert!(RateLimitState::per_hour(0, false).is_none());
    }

    #[test]
    fn test_limit_is_per_ip() {
        let state = RateLimitState::per_hour(2, false).unwrap();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(state.check(a));
        assert!(state.check(a));
        assert!(!state.check(a));
        assert!(state.check(b));
    }

    #[test]
    fn test_prune_drops_expired_clients() {
        let (state, clock) = fake_clock_state(2);
        for n in 0..100 {
            assert!(state.check(nth_ip(n)));
        }
        assert_eq!(state.tracked_clients(), 100);

        state.prune();
        assert_eq!(state.tracked_clients(), 100);

        clock.advance(Duration::from_secs(3 * 3600));
        state.prune();
        assert_eq!(state.tracked_clients(), 0);
    }

    #[test]
    fn test_checks_prune_periodically() {
        let (state, clock) = fake_clock_state(2);
        for n in 0..(PRUNE_EVERY - 1) as u32 {
            state.check(nth_ip(n));
        }
        assert_eq!(state.tracked_clients(), (PRUNE_EVERY - 1) as usize);

        clock.advance(Duration::from_secs(3 * 3600));
        assert!(state.check(nth_ip(0)));
        assert_eq!(state.tracked_clients(), 1);
    }

    #[test]
    fn test_limited_client_stays_limited_after_prune() {
        let (state, _clock) = fake_clock_state(2);
        let ip = nth_ip(1);
        assert!(state.check(ip));
        assert!(state.check(ip));
        state.prune();
        assert!(!state.check(ip));
    }

    #[test]
    fn test_client_ip_ignores_headers_without_trusted_proxy() {
        let peer: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1"));

        assert_eq!(client_ip(&headers, Some(peer), false), peer.ip());
        assert_eq!(
            client_ip(&headers, None, false),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn test_client_ip_behind_trusted_proxy_uses_last_hop() {
        let peer: SocketAddr = "10.0.0.5:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer), true), peer.ip());

        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.7"));
        assert_eq!(client_ip(&headers, Some(peer), true).to_string(), "203.0.113.7");

        // First hop is whatever the client sent
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 198.51.100.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer), true).to_string(), "198.51.100.1");
    }
}
