//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket per client to slow down password guessing.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

use crate::api::ApiError;

/// Per-client rate limiter.
pub type ClientLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Login attempts allowed per second per client when not configured.
pub const DEFAULT_LOGIN_PER_SEC: u32 = 1;

/// Login attempts a client may burst before being limited.
pub const DEFAULT_LOGIN_BURST: u32 = 5;

#[derive(Clone)]
pub struct RateLimitConfig {
    pub login: Arc<ClientLimiter>,
    /// Key clients by the first `X-Forwarded-For` entry. Only enable behind a proxy that
    /// overwrites the header.
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    /// Zero values are raised to one.
    pub fn new(per_second: u32, burst: u32, trust_forwarded_for: bool) -> Self {
        let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);

        Self {
            login: Arc::new(RateLimiter::keyed(
                Quota::per_second(per_second).allow_burst(burst),
            )),
            trust_forwarded_for,
        }
    }

    /// Key identifying the client that sent `request`.
    pub fn client_key(&self, request: &Request) -> String {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(client) = forwarded {
                return client.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PER_SEC, DEFAULT_LOGIN_BURST, false)
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let client = config.client_key(&request);

    match config.login.check_key(&client) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            ApiError::too_many_requests("Too many login attempts. Please wait before trying again.")
                .into_response()
        }
    }
}
