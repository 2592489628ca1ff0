//! Core domain types for application intake.
//!
//! Provides the application record, the submission rules, storage error
//! handling, and the store abstraction the HTTP layer writes through.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;
pub mod validation;

pub use error::{Result, StorageError};
pub use models::{Application, ApplicationId, NewApplication};
pub use storage::{mock::MemoryApplicationStore, ApplicationStore, Storage};
pub use time::{Clock, RealClock, TestClock};
pub use validation::{validate, ApplicationForm, ValidationError};
