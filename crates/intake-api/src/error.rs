//! Response envelope and the errors a submission can end in.
//!
//! Every JSON response from the intake route has the shape
//! `{"status": "Success" | "Error", "msg": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_core::{StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned when an application is stored.
pub const SUBMIT_SUCCESSFUL: &str = "Submit Successful";

/// Outcome marker in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The request did what it asked.
    Success,
    /// The request failed; `msg` says why.
    Error,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Machine-readable outcome.
    pub status: Outcome,
    /// Human-readable detail.
    pub msg: String,
}

impl StatusMessage {
    /// A success envelope.
    pub fn success(msg: impl Into<String>) -> Self {
        Self { status: Outcome::Success, msg: msg.into() }
    }

    /// An error envelope.
    pub fn error(msg: impl Into<String>) -> Self {
        Self { status: Outcome::Error, msg: msg.into() }
    }
}

/// Ways a submission can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body could not be read as a submission.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// A submission rule failed. Client error, nothing stored.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The write did not complete.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(StatusMessage::error(self.to_string()))).into_response()
    }
}
