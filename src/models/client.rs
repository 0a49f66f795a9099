//! Upstream generation client
//!
//! [`CompletionClient`] is the seam between the fallback chain and the
//! network. [`GeminiClient`] speaks the Generative Language REST API and
//! classifies every failure into a [`ModelError`].

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult, ModelError};
use crate::prompt::Prompt;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum characters of upstream error body kept for logging
const MAX_ERROR_DETAIL_CHARS: usize = 512;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sends one prompt to one model
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &Prompt,
    ) -> Result<GenerateContentResponse, ModelError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

/// Body of a successful `generateContent` call
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Content {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Single-candidate, single-part response
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part {
                        text: Some(text.into()),
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    /// Text of the first candidate with all parts joined
    ///
    /// Returns `None` when there is no candidate or its text is blank.
    pub fn first_candidate_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP client
// ─────────────────────────────────────────────────────────────────────────────

/// Generative Language REST client
///
/// Holds a single pooled `reqwest::Client`; cloning is cheap.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_seconds: u64,
    temperature: f64,
    max_output_tokens: u32,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from upstream settings and the resolved API key
    pub fn new(config: &UpstreamConfig, api_key: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout_seconds: config.timeout_seconds(),
            temperature: config.temperature(),
            max_output_tokens: config.max_output_tokens(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &Prompt,
    ) -> Result<GenerateContentResponse, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.as_str(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let url = self.endpoint_url(model);
        tracing::debug!(model = %model, prompt_chars = prompt.len(), "Calling upstream model");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(model, status, &body));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.classify_transport(model, e)
                } else {
                    ModelError::Decode {
                        model: model.to_string(),
                        detail: e.to_string(),
                    }
                }
            })
    }
}

impl GeminiClient {
    fn classify_transport(&self, model: &str, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout {
                model: model.to_string(),
                timeout_seconds: self.timeout_seconds,
            }
        } else {
            ModelError::Transport {
                model: model.to_string(),
                detail: err.to_string(),
            }
        }
    }
}

/// Map a non-success upstream status to a [`ModelError`]
///
/// - `404`, or `400` mentioning "not found"/"not supported" → NotFound
/// - `503` → Overloaded, `429` → RateLimited
/// - anything else → Rejected (fatal)
pub fn classify_status(model: &str, status: StatusCode, body: &str) -> ModelError {
    let detail = truncate_detail(body);
    let model = model.to_string();

    match status {
        StatusCode::NOT_FOUND => ModelError::NotFound {
            model,
            status: status.as_u16(),
            detail,
        },
        StatusCode::BAD_REQUEST if mentions_unknown_model(body) => ModelError::NotFound {
            model,
            status: status.as_u16(),
            detail,
        },
        StatusCode::SERVICE_UNAVAILABLE => ModelError::Overloaded { model, detail },
        StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited { model, detail },
        other => ModelError::Rejected {
            model,
            status: other.as_u16(),
            detail,
        },
    }
}

fn mentions_unknown_model(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("not found") || lower.contains("not supported")
}

fn truncate_detail(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
