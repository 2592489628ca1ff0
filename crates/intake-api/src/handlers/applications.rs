//! Application intake handler.
//!
//! Parses the submission, applies the rules in
//! [`intake_core::validation`], and performs one insert. Validation
//! failures never reach the store.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use intake_core::{validate, Application, ApplicationForm, StorageError};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    error::{ApiError, StatusMessage, SUBMIT_SUCCESSFUL},
    server::AppState,
};

/// Accepts one application.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 400: malformed body or a failed submission rule
/// - 500: the store could not complete the write
#[instrument(
    name = "submit_application",
    skip(state, headers, body),
    fields(content_length = body.len())
)]
pub async fn submit_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match submit(&state, &headers, &body).await {
        Ok(stored) => {
            info!(application_id = %stored.id, "Application stored");
            (StatusCode::OK, Json(StatusMessage::success(SUBMIT_SUCCESSFUL))).into_response()
        },
        Err(e) => e.into_response(),
    }
}

async fn submit(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Application, ApiError> {
    let form = parse_form(headers, body).inspect_err(|e| {
        debug!(error = %e, "Rejected unreadable submission");
    })?;

    let application = validate(form).inspect_err(|e| {
        debug!(field = e.field(), reason = %e, "Submission failed validation");
    })?;

    // The insert runs on its own task so it still completes if the client
    // goes away or the request times out.
    let store = state.store.clone();
    let write = tokio::spawn(async move { store.insert(application).await });

    let stored = match write.await {
        Ok(result) => result,
        Err(join_error) => Err(StorageError::Database(join_error.to_string())),
    };

    stored.map_err(|e| {
        error!(error = %e, "Failed to persist application");
        ApiError::Storage(e)
    })
}

/// Reads the submission from a request body.
///
/// Bodies that are empty, not declared as JSON, or a JSON array carry no
/// fields, which then fail the first presence rule. Any other top-level
/// value that is not an object is malformed.
fn parse_form(headers: &HeaderMap, body: &[u8]) -> Result<ApplicationForm, ApiError> {
    if body.is_empty() || !is_json(headers) {
        return Ok(ApplicationForm::default());
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    match value {
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| ApiError::MalformedBody(e.to_string()))
        },
        Value::Array(_) => Ok(ApplicationForm::default()),
        _ => Err(ApiError::MalformedBody("expected a JSON object".to_string())),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
