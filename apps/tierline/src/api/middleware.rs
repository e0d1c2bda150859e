//! # Middleware Module
//!
//! Global rate limiting for the view server.
//! `TIERLINE_RATE_LIMIT`: requests per second (default 100, 0 disables).

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

const DEFAULT_RPS: u32 = 100;

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub fn create_rate_limiter(requests_per_second: NonZeroU32) -> GlobalRateLimiter {
    Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second)))
}

/// Parse a rate limit setting. `None` disables limiting; unparsable input
/// falls back to the default.
pub fn parse_rate_limit(raw: Option<&str>) -> Option<NonZeroU32> {
    let rps = raw
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_RPS);
    NonZeroU32::new(rps)
}

/// Rate limit from `TIERLINE_RATE_LIMIT`.
pub fn get_rate_limit_from_env() -> Option<NonZeroU32> {
    parse_rate_limit(std::env::var("TIERLINE_RATE_LIMIT").ok().as_deref())
}

/// Rejects with 429 once the global quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}
