//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Security headers
//! 4. CORS (only the configured origin is echoed back, when one is set)
//! 5. Per-address rate limiting
//! 6. Timeout enforcement
//! 7. Handler execution
//!
//! # Graceful Shutdown
//!
//! The server handles SIGINT and SIGTERM by refusing new connections and
//! letting in-flight requests finish. Closing the store is left to the
//! caller, which owns it.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::Request,
    http::{header::HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use intake_core::{ApplicationStore, Clock, RealClock};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use uuid::Uuid;

use crate::{
    handlers,
    middleware::{
        rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimiter},
        security_headers::security_headers,
    },
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Where accepted applications are written.
    pub store: Arc<dyn ApplicationStore>,
    /// Time source for health timestamps and rate-limit windows.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates state backed by `store` and the system clock.
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store, clock: Arc::new(RealClock::new()) }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Cross-cutting request policy wrapped around the routes.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    /// Only origin allowed for cross-origin requests; any origin when unset.
    pub frontend_origin: Option<HeaderValue>,
    /// Per-address request budget.
    pub rate_limit: RateLimitConfig,
    /// Upper bound on handler time.
    pub request_timeout: Duration,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            frontend_origin: None,
            rate_limit: RateLimitConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use intake_api::{create_router, AppState, HttpPolicy};
/// use intake_core::MemoryApplicationStore;
///
/// let state = AppState::new(Arc::new(MemoryApplicationStore::new()));
/// let app = create_router(state, &HttpPolicy::default());
/// // Serve the app...
/// ```
pub fn create_router(state: AppState, policy: &HttpPolicy) -> Router {
    let limiter = RateLimiter::new(policy.rate_limit, state.clock.clone());

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/new/application", post(handlers::submit_application))
        .layer(TimeoutLayer::new(policy.request_timeout))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(cors_layer(policy.frontend_origin.clone()))
        .layer(middleware::from_fn(security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

fn cors_layer(frontend_origin: Option<HeaderValue>) -> CorsLayer {
    let origin = match frontend_origin {
        Some(origin) => AllowOrigin::list([origin]),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
}

/// Middleware to inject request ID into all responses.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// Client addresses are exposed to the rate limiter through
/// `ConnectInfo`.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while running.
pub async fn start_server(
    state: AppState,
    policy: &HttpPolicy,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(state, policy);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server is running on {}", actual_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
