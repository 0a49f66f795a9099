//! Error types for the concierge gateway
//!
//! Two caller-visible failure classes exist: bad input (400, describable) and
//! generic service failure (500, never describes the cause). Everything else
//! is logged server side only.

use crate::catalog::CatalogError;
use crate::models::ChainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Fallback body for 500 responses rendered without access to contact details
///
/// The chat handler renders its own localized failure text; this message only
/// appears when an `AppError` escapes through a different path.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong on our side. Please contact us directly for assistance.";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// User-caused; the only variant whose text reaches the client
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Upstream credential absent at process start
    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    /// Listing store read failed while assembling context
    #[error("Listing store unavailable: {0}")]
    UpstreamUnavailable(#[from] CatalogError),

    /// Fallback chain aborted or exhausted every model
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code this error maps to at the HTTP boundary
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidInput(msg) => {
                let body = Json(serde_json::json!({ "error": msg }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            other => {
                tracing::error!(error = %other, "Request failed with internal error");
                let body = Json(serde_json::json!({ "answer": GENERIC_FAILURE_MESSAGE }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single call to the upstream generation service
///
/// Classification drives the retry executor and the fallback chain:
/// - retryable (congestion): `Overloaded`, `RateLimited`, `Timeout`
/// - skip to next model without retry: `NotFound`
/// - abort the chain: everything else
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model '{model}' not found or unsupported (status {status}): {detail}")]
    NotFound {
        model: String,
        status: u16,
        detail: String,
    },

    #[error("model '{model}' is overloaded (status 503): {detail}")]
    Overloaded { model: String, detail: String },

    #[error("model '{model}' rate limited (status 429): {detail}")]
    RateLimited { model: String, detail: String },

    #[error("model '{model}' timed out after {timeout_seconds}s")]
    Timeout { model: String, timeout_seconds: u64 },

    #[error("model '{model}' rejected the request (status {status}): {detail}")]
    Rejected {
        model: String,
        status: u16,
        detail: String,
    },

    #[error("transport failure calling model '{model}': {detail}")]
    Transport { model: String, detail: String },

    #[error("could not decode response from model '{model}': {detail}")]
    Decode { model: String, detail: String },
}

impl ModelError {
    /// Returns true for transient upstream congestion worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::Overloaded { .. } | ModelError::RateLimited { .. } | ModelError::Timeout { .. }
        )
    }

    /// Returns true when the model is permanently unusable
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }

    /// Model identifier the failure belongs to
    pub fn model(&self) -> &str {
        match self {
            ModelError::NotFound { model, .. }
            | ModelError::Overloaded { model, .. }
            | ModelError::RateLimited { model, .. }
            | ModelError::Timeout { model, .. }
            | ModelError::Rejected { model, .. }
            | ModelError::Transport { model, .. }
            | ModelError::Decode { model, .. } => model,
        }
    }

    /// HTTP status signaled by the upstream, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ModelError::NotFound { status, .. } | ModelError::Rejected { status, .. } => {
                Some(*status)
            }
            ModelError::Overloaded { .. } => Some(503),
            ModelError::RateLimited { .. } => Some(429),
            ModelError::Timeout { .. } | ModelError::Transport { .. } | ModelError::Decode { .. } => {
                None
            }
        }
    }

    /// Stable label for logs and metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            ModelError::NotFound { .. } => "not_found",
            ModelError::Overloaded { .. } => "overloaded",
            ModelError::RateLimited { .. } => "rate_limited",
            ModelError::Timeout { .. } => "timeout",
            ModelError::Rejected { .. } => "rejected",
            ModelError::Transport { .. } => "transport",
            ModelError::Decode { .. } => "decode",
        }
    }
}
