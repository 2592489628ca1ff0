//! HTTP request handlers.
//!
//! - `health` - liveness (`GET /`) and health (`GET /health`) probes
//! - `applications` - the intake route (`POST /api/new/application`)
//!
//! Intake responses use the `{status, msg}` envelope from
//! [`crate::error`].

pub mod applications;
pub mod health;

pub use applications::submit_application;
pub use health::{health_check, root};
