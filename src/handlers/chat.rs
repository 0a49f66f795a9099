//! Chat endpoint handler
//!
//! Handles `POST /api/chat`. Each request moves through a fixed sequence of
//! states and ends in exactly one terminal response:
//!
//! ```text
//! Received ──sanitize──▶ Sanitized ──credential──▶ Ready ──context──▶ ContextReady
//!    │                       │                              │               │
//!    ▼                       ▼                              ▼               ▼ prompt + chain
//! 400 bad input       500 misconfigured            500 generic     200 answer / 500 generic
//! ```
//!
//! Only bad-input responses describe the problem; every 500 carries a
//! localized apology with contact details and nothing else.

use crate::catalog::ContactBlock;
use crate::context::KnowledgeSnapshot;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::extractor::ValidatedJson;
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use crate::models::{ChainError, ModelAttempt};
use crate::prompt::Prompt;
use crate::response::{Language, format_answer, generic_failure_message};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Maximum allowed message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 2_000;

/// Sanitized chat request
///
/// Fields are private; the only way to build one is through validation, so a
/// `ChatRequest` always holds a trimmed, non-empty, bounded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    message: String,
    language: Language,
}

impl ChatRequest {
    /// Validate and trim a raw message
    pub fn new(message: &str, language: Language) -> Result<Self, AppError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(
                "message cannot be empty or contain only whitespace".to_string(),
            ));
        }

        let char_count = trimmed.chars().count();
        if char_count > MAX_MESSAGE_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "message exceeds maximum length of {} characters (got {})",
                MAX_MESSAGE_LENGTH, char_count
            )));
        }

        Ok(Self {
            message: trimmed.to_string(),
            language,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl TryFrom<Value> for ChatRequest {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut body) = value else {
            return Err(AppError::InvalidInput(
                "request body must be a JSON object".to_string(),
            ));
        };

        let message = match body.remove("message") {
            None | Some(Value::Null) => {
                return Err(AppError::InvalidInput("message is required".to_string()));
            }
            Some(Value::String(message)) => message,
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "message must be a string".to_string(),
                ));
            }
        };

        let language = match body.remove("language") {
            None | Some(Value::Null) => Language::default(),
            Some(Value::String(tag)) => tag.parse::<Language>().map_err(AppError::InvalidInput)?,
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "language must be \"en\" or \"sw\"".to_string(),
                ));
            }
        };

        Self::new(&message, language)
    }
}

/// Chat response body
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// `POST /api/chat`
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<ValidatedJson<ChatRequest>, AppError>,
) -> Response {
    let start = Instant::now();
    let (outcome, response) = process(&state, &request_id, payload).await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    tracing::info!(
        request_id = %request_id,
        outcome = outcome.as_str(),
        status = response.status().as_u16(),
        duration_ms = duration_ms,
        "Chat request finished"
    );

    let metrics = state.metrics();
    if let Err(e) = metrics.record_request(outcome) {
        tracing::error!(request_id = %request_id, error = %e, "Failed to record request metric");
        metrics.metrics_recording_failure("record_request");
    }
    if let Err(e) = metrics.record_request_duration(outcome, duration_ms) {
        tracing::error!(request_id = %request_id, error = %e, "Failed to record duration metric");
        metrics.metrics_recording_failure("record_request_duration");
    }

    response
}

async fn process(
    state: &AppState,
    request_id: &RequestId,
    payload: Result<ValidatedJson<ChatRequest>, AppError>,
) -> (Outcome, Response) {
    let contact = &state.config().contact;

    // Received -> Sanitized
    let request = match payload {
        Ok(ValidatedJson(request)) => request,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Rejected chat request");
            return (Outcome::BadInput, err.into_response());
        }
    };
    let language = request.language();

    tracing::debug!(
        request_id = %request_id,
        language = %language,
        message_chars = request.message().chars().count(),
        "Chat request sanitized"
    );

    // Credential check precedes any I/O
    let Some(client) = state.client() else {
        let err = AppError::Misconfigured(format!(
            "upstream credential '{}' is not set",
            state.config().upstream.api_key_env()
        ));
        return (
            Outcome::Misconfigured,
            generic_failure(request_id, language, contact, err),
        );
    };

    // Sanitized -> ContextReady
    let snapshot = match KnowledgeSnapshot::collect(state.store(), contact).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return (
                Outcome::ContextUnavailable,
                generic_failure(request_id, language, contact, AppError::from(err)),
            );
        }
    };

    tracing::debug!(
        request_id = %request_id,
        hotels = snapshot.hotel_count(),
        packages = snapshot.package_count(),
        "Knowledge snapshot assembled"
    );

    // ContextReady -> PromptReady
    let knowledge = snapshot.render(state.config().context.max_listing_chars);
    let prompt = Prompt::build(&knowledge, request.message());

    // PromptReady -> terminal
    let request_id_str = request_id.to_string();
    match state
        .chain()
        .complete(client.as_ref(), &prompt, &request_id_str)
        .await
    {
        Ok(success) => {
            record_attempts(state, request_id, &success.attempts);
            let answer = format_answer(&success.response, language, contact);
            let outcome = if answer.is_fallback() {
                tracing::warn!(
                    request_id = %request_id,
                    model = %success.model,
                    "Model returned no usable text, substituting fallback answer"
                );
                Outcome::FallbackAnswer
            } else {
                Outcome::Answered
            };
            (
                outcome,
                (
                    StatusCode::OK,
                    Json(ChatResponse {
                        answer: answer.into_text(),
                    }),
                )
                    .into_response(),
            )
        }
        Err(err) => {
            record_attempts(state, request_id, err.attempts());
            log_chain_failure(request_id, &err);
            (
                Outcome::GenericFailure,
                generic_failure(request_id, language, contact, AppError::from(err)),
            )
        }
    }
}

/// Log the full error server side and answer with the localized apology
fn generic_failure(
    request_id: &RequestId,
    language: Language,
    contact: &ContactBlock,
    err: AppError,
) -> Response {
    tracing::error!(
        request_id = %request_id,
        error = %err,
        "Chat request failed"
    );
    (
        err.status(),
        Json(ChatResponse {
            answer: generic_failure_message(language, contact),
        }),
    )
        .into_response()
}

fn log_chain_failure(request_id: &RequestId, err: &ChainError) {
    tracing::error!(
        request_id = %request_id,
        error_type = err.error_type(),
        attempts = err.attempts().len(),
        "Fallback chain failed"
    );
}

fn record_attempts(state: &AppState, request_id: &RequestId, attempts: &[ModelAttempt]) {
    let metrics = state.metrics();
    for attempt in attempts {
        if let Err(e) = metrics.record_model_attempt(&attempt.model, attempt.outcome) {
            tracing::error!(
                request_id = %request_id,
                model = %attempt.model,
                error = %e,
                "Failed to record model attempt metric"
            );
            metrics.metrics_recording_failure("record_model_attempt");
        }
    }
}
