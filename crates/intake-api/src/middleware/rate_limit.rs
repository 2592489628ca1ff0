//! Fixed-window rate limiting per client address.
//!
//! Each address gets `max_requests` within a window that starts at its
//! first request. Requests without a known address (no `ConnectInfo`, as in
//! in-process tests) share one bucket. Expired windows are dropped lazily,
//! at most once per window length.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use intake_core::Clock;
use tokio::sync::Mutex;
use tracing::warn;

/// Body of the 429 response.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Request budget per client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: 100, window: Duration::from_secs(15 * 60) }
    }
}

/// Outcome of charging one request against a client's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted; `remaining` more fit in the current window.
    Allowed {
        /// Requests left in the window after this one.
        remaining: u32,
    },
    /// Budget exhausted until the window resets.
    Limited {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Buckets {
    windows: HashMap<Option<IpAddr>, Window>,
    last_pruned: Instant,
}

/// Shared per-address request counter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    /// Creates a limiter measuring windows with `clock`.
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            config,
            clock,
            buckets: Arc::new(Mutex::new(Buckets { windows: HashMap::new(), last_pruned: now })),
        }
    }

    /// Limits this limiter enforces.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Charges one request to `client` and reports whether it may proceed.
    pub async fn check(&self, client: Option<IpAddr>) -> RateDecision {
        let now = self.clock.now();
        let window = self.config.window;
        let mut buckets = self.buckets.lock().await;

        if now.duration_since(buckets.last_pruned) >= window {
            buckets.windows.retain(|_, w| now.duration_since(w.started) < window);
            buckets.last_pruned = now;
        }

        let entry = buckets.windows.entry(client).or_insert(Window { started: now, count: 0 });
        let elapsed = now.duration_since(entry.started);
        if elapsed >= window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.config.max_requests {
            return RateDecision::Limited {
                retry_after: window.saturating_sub(now.duration_since(entry.started)),
            };
        }

        entry.count += 1;
        RateDecision::Allowed { remaining: self.config.max_requests - entry.count }
    }

    /// Number of addresses with a live or not yet pruned window.
    pub async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.windows.len()
    }
}

/// Axum middleware enforcing a [`RateLimiter`].
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let client =
        req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip());
    let limit = HeaderValue::from(limiter.config().max_requests);

    match limiter.check(client).await {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, limit);
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        },
        RateDecision::Limited { retry_after } => {
            warn!(
                client = ?client,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    (RETRY_AFTER, HeaderValue::from(retry_secs)),
                    (LIMIT_HEADER, limit),
                    (REMAINING_HEADER, HeaderValue::from(0u32)),
                ],
                RATE_LIMITED_MESSAGE,
            )
                .into_response()
        },
    }
}
