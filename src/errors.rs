use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::models::{ProviderKind, ProviderStatus};

/// Failure modes of a single verification attempt.
///
/// Provider clients never return these to their caller; they are folded
/// into a `ProviderResult` via [`VerificationError::status`] and `Display`.
/// Only `Internal` ever surfaces from the orchestrator, and then as a
/// degraded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Credential missing or still the placeholder value.
    NotConfigured(ProviderKind),
    /// Malformed input field; the network was never touched.
    Validation(String),
    /// The provider's request budget for the current window is spent.
    RateLimited(ProviderKind),
    /// Network fault, timeout, non-2xx status or unreadable body.
    Transport(String),
    /// Fault inside the orchestration itself.
    Internal(String),
}

impl VerificationError {
    /// Status a `ProviderResult` carries for this failure.
    pub fn status(&self) -> ProviderStatus {
        match self {
            VerificationError::NotConfigured(_) => ProviderStatus::NotConfigured,
            _ => ProviderStatus::Error,
        }
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::NotConfigured(kind) => write!(
                f,
                "{} API key not configured. Please set up your environment variables.",
                kind.source_name()
            ),
            VerificationError::Validation(msg) => write!(f, "{}", msg),
            VerificationError::RateLimited(kind) => {
                write!(f, "Rate limit exceeded for {}. Try again later.", kind)
            }
            VerificationError::Transport(msg) => write!(f, "{}", msg),
            VerificationError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for VerificationError {}

/// Errors returned by the HTTP front end.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Request body could not be read as a tenant record.
    BadRequest(String),
    /// Unknown resource (e.g. an unrecognised provider name).
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a JSON `{"error": ...}` body.
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
