use crate::pricing::models::Provider;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single provider resolution
///
/// Never crosses the aggregator: every variant ends in that provider's static
/// fallback rates.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {message}")]
    UpstreamStatus { status: StatusCode, message: String },

    #[error("Malformed pricing payload: {0}")]
    MalformedPayload(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Provider {0} is disabled")]
    Disabled(Provider),

    #[error("Pricing fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl PricingError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::MissingCredential(_) => "missing_credential",
            Self::Disabled(_) => "disabled",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Invalid client input
    BadRequest(String),
    /// Defect that escaped the comparison pipeline
    Internal { message: String, details: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Internal { message, details } => write!(f, "Internal error: {} ({})", message, details),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response(),
            Self::Internal { message, details } => {
                tracing::error!(error = %message, details = %details, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message, "details": details })),
                )
                    .into_response()
            }
        }
    }
}
