//! Request policies wrapped around the routes.
//!
//! Rate limiting per client address and hardening response headers. CORS,
//! request tracing and timeouts come straight from `tower_http` and are
//! wired in [`crate::server::create_router`].
pub mod rate_limit;
pub mod security_headers;
