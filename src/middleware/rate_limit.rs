//! Per-IP rate limiting middleware using governor.
//!
//! This protects the HTTP surface from abusive clients. It is unrelated to the
//! daily swipe quota, which is a persistent per-user limit enforced in the
//! swipe handler against the database.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{HeaderValue, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use serde::Serialize;
use std::{net::IpAddr, net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};
use tracing::warn;

pub type KeyedRateLimiter =
    RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_size: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst_size: 30,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: (requests_per_minute / 2).max(1),
            enabled: true,
        }
    }

    /// Tighter budget for the credential endpoints.
    pub fn strict() -> Self {
        Self {
            requests_per_minute: 20,
            burst_size: 10,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn create_limiter(&self) -> Option<Arc<KeyedRateLimiter>> {
        if !self.enabled {
            return None;
        }

        // Replenish interval: e.g. 60 req/min = 1 token per second
        let replenish_interval_ns = 60_000_000_000u128 / self.requests_per_minute.max(1) as u128;
        let replenish_interval = Duration::from_nanos(replenish_interval_ns as u64);

        let quota = Quota::with_period(replenish_interval)
            .expect("Replenish interval should be valid")
            .allow_burst(
                NonZeroU32::new(self.burst_size.max(1)).expect("Burst size should be non-zero"),
            );

        Some(Arc::new(RateLimiter::dashmap(quota)))
    }
}

#[derive(Clone)]
pub struct RateLimitState {
    pub global_limiter: Option<Arc<KeyedRateLimiter>>,
    pub auth_limiter: Option<Arc<KeyedRateLimiter>>,
    pub config: RateLimitConfig,
}

impl RateLimitState {
    pub fn with_config(global_config: RateLimitConfig, auth_config: RateLimitConfig) -> Self {
        Self {
            global_limiter: global_config.create_limiter(),
            auth_limiter: auth_config.create_limiter(),
            config: global_config,
        }
    }

    pub fn disabled() -> Self {
        Self {
            global_limiter: None,
            auth_limiter: None,
            config: RateLimitConfig::disabled(),
        }
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::with_config(RateLimitConfig::default(), RateLimitConfig::strict())
    }
}

#[derive(Debug, Serialize)]
pub struct RateLimitExceeded {
    pub error: String,
    pub retry_after_secs: u64,
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::to_string(&self)
            .unwrap_or_else(|_| r#"{"error":"Rate limit exceeded"}"#.to_string());

        let mut response = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header("Content-Type", "application/json")
            .header("Retry-After", self.retry_after_secs.to_string())
            .body(Body::from(body))
            .unwrap();

        if let Ok(value) = HeaderValue::from_str(&self.retry_after_secs.to_string()) {
            response.headers_mut().insert("X-RateLimit-Reset", value);
        }

        response
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED))
}

fn check(
    limiter: &KeyedRateLimiter,
    ip: IpAddr,
    what: &'static str,
) -> Result<(), RateLimitExceeded> {
    match limiter.check_key(&ip) {
        Ok(_) => Ok(()),
        Err(not_until) => {
            let wait_duration = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait_duration.as_secs().max(1);

            warn!(ip = %ip, retry_after_secs = retry_after, "{} rate limit exceeded", what);

            Err(RateLimitExceeded {
                error: "Too many requests".to_string(),
                retry_after_secs: retry_after,
            })
        }
    }
}

pub async fn rate_limit_middleware(
    rate_limit_state: Option<axum::extract::Extension<RateLimitState>>,
    request: Request,
    next: Next,
) -> Result<axum::response::Response, RateLimitExceeded> {
    let state = match rate_limit_state {
        Some(axum::extract::Extension(state)) => state,
        None => return Ok(next.run(request).await),
    };

    let limiter = match &state.global_limiter {
        Some(limiter) => limiter,
        None => return Ok(next.run(request).await),
    };

    check(limiter, client_ip(&request), "Request")?;

    let mut response = next.run(request).await;
    add_rate_limit_headers(&mut response, &state.config);
    Ok(response)
}

pub async fn auth_rate_limit_middleware(
    rate_limit_state: Option<axum::extract::Extension<RateLimitState>>,
    request: Request,
    next: Next,
) -> Result<axum::response::Response, RateLimitExceeded> {
    let state = match rate_limit_state {
        Some(axum::extract::Extension(state)) => state,
        None => return Ok(next.run(request).await),
    };

    let limiter = match &state.auth_limiter {
        Some(limiter) => limiter,
        None => return Ok(next.run(request).await),
    };

    check(limiter, client_ip(&request), "Auth")?;

    let mut response = next.run(request).await;
    add_rate_limit_headers(&mut response, &state.config);
    Ok(response)
}

fn add_rate_limit_headers(response: &mut axum::response::Response, config: &RateLimitConfig) {
    if let Ok(value) = HeaderValue::from_str(&config.requests_per_minute.to_string()) {
        response.headers_mut().insert("X-RateLimit-Limit", value);
    }
}
