//! Model fallback chain
//!
//! Walks the configured models in order, running each under the retry
//! executor. Classification per model:
//! - success: stop and return the response
//! - not found / unsupported: advance immediately, no backoff
//! - retryable failure after retries are exhausted: advance
//! - any other failure: abort the whole chain
//!
//! Attempt records are collected for logs and metrics only.

use super::client::{CompletionClient, GenerateContentResponse};
use crate::error::ModelError;
use crate::prompt::Prompt;
use crate::shared::retry::{self, RetryPolicy};
use std::fmt;
use thiserror::Error;

/// How a single upstream attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::RetryableFailure => "retryable_failure",
            AttemptOutcome::FatalFailure => "fatal_failure",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to one model during a chain traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub attempt_index: usize,
    pub outcome: AttemptOutcome,
}

/// Successful traversal
#[derive(Debug, Clone)]
pub struct ChainSuccess {
    pub response: GenerateContentResponse,
    pub model: String,
    pub attempts: Vec<ModelAttempt>,
}

/// Failed traversal
#[derive(Debug, Error)]
pub enum ChainError {
    /// Every model was tried; `last` is kept for logging only
    #[error("all {tried} models exhausted; last error: {last}")]
    AllModelsExhausted {
        tried: usize,
        last: ModelError,
        attempts: Vec<ModelAttempt>,
    },

    /// A non-retryable, non-skippable failure stopped the chain
    #[error("fallback chain aborted at model '{model}': {source}")]
    Aborted {
        model: String,
        #[source]
        source: ModelError,
        attempts: Vec<ModelAttempt>,
    },

    #[error("fallback chain has no models configured")]
    NoModels,
}

impl ChainError {
    pub fn attempts(&self) -> &[ModelAttempt] {
        match self {
            ChainError::AllModelsExhausted { attempts, .. }
            | ChainError::Aborted { attempts, .. } => attempts,
            ChainError::NoModels => &[],
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ChainError::AllModelsExhausted { .. } => "all_models_exhausted",
            ChainError::Aborted { .. } => "aborted",
            ChainError::NoModels => "no_models",
        }
    }
}

/// Ordered model list plus the per-model retry policy
#[derive(Debug, Clone)]
pub struct FallbackChain {
    models: Vec<String>,
    policy: RetryPolicy,
}

impl FallbackChain {
    pub fn new(models: Vec<String>, policy: RetryPolicy) -> Self {
        Self { models, policy }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `prompt` through the chain until one model answers
    pub async fn complete(
        &self,
        client: &dyn CompletionClient,
        prompt: &Prompt,
        request_id: &str,
    ) -> Result<ChainSuccess, ChainError> {
        let mut attempts = Vec::new();
        let mut last_error = None;

        for (position, model) in self.models.iter().enumerate() {
            tracing::debug!(
                request_id = %request_id,
                model = %model,
                position = position + 1,
                total = self.models.len(),
                "Trying model"
            );

            let mut made = 0;
            let result = retry::execute(
                &self.policy,
                |attempt_index| {
                    made = attempt_index + 1;
                    client.generate(model, prompt)
                },
                ModelError::is_retryable,
            )
            .await;

            record_attempts(&mut attempts, model, made, &result);

            match result {
                Ok(response) => {
                    tracing::info!(
                        request_id = %request_id,
                        model = %model,
                        attempts = made,
                        "Model produced completion"
                    );
                    return Ok(ChainSuccess {
                        response,
                        model: model.clone(),
                        attempts,
                    });
                }
                Err(err) if err.is_not_found() => {
                    tracing::warn!(
                        request_id = %request_id,
                        model = %model,
                        status = ?err.status(),
                        error = %err,
                        "Model not found or unsupported, advancing to next model"
                    );
                    last_error = Some(err);
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        request_id = %request_id,
                        model = %model,
                        attempts = made,
                        error_type = err.error_type(),
                        error = %err,
                        "Model still failing after retries, advancing to next model"
                    );
                    last_error = Some(err);
                }
                Err(err) => {
                    tracing::error!(
                        request_id = %request_id,
                        model = %model,
                        status = ?err.status(),
                        error_type = err.error_type(),
                        error = %err,
                        "Fatal upstream error, aborting fallback chain"
                    );
                    return Err(ChainError::Aborted {
                        model: model.clone(),
                        source: err,
                        attempts,
                    });
                }
            }
        }

        match last_error {
            Some(last) => Err(ChainError::AllModelsExhausted {
                tried: self.models.len(),
                last,
                attempts,
            }),
            None => Err(ChainError::NoModels),
        }
    }
}

/// Rebuild per-attempt records from the attempt count and final result
///
/// Every attempt before the last one was a retryable failure; the last one
/// carries the final result.
fn record_attempts(
    attempts: &mut Vec<ModelAttempt>,
    model: &str,
    count: usize,
    result: &Result<GenerateContentResponse, ModelError>,
) {
    for attempt_index in 0..count {
        let outcome = if attempt_index + 1 < count {
            AttemptOutcome::RetryableFailure
        } else {
            match result {
                Ok(_) => AttemptOutcome::Success,
                Err(err) if err.is_retryable() => AttemptOutcome::RetryableFailure,
                Err(_) => AttemptOutcome::FatalFailure,
            }
        };
        attempts.push(ModelAttempt {
            model: model.to_string(),
            attempt_index,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted client: each model returns its queued results in order, then
    /// repeats the last one
    struct ScriptedClient {
        scripts: HashMap<String, Vec<Result<GenerateContentResponse, ModelError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new() -> Self {
            Self {
                scripts: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn script(
            mut self,
            model: &str,
            results: Vec<Result<GenerateContentResponse, ModelError>>,
        ) -> Self {
            self.scripts.insert(model.to_string(), results);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn generate(
            &self,
            model: &str,
            _prompt: &Prompt,
        ) -> Result<GenerateContentResponse, ModelError> {
            let call_index = {
                let mut calls = self.calls.lock().unwrap();
                let index = calls.iter().filter(|m| m.as_str() == model).count();
                calls.push(model.to_string());
                index
            };
            let script = &self.scripts[model];
            script[call_index.min(script.len() - 1)].clone()
        }
    }

    fn overloaded(model: &str) -> ModelError {
        ModelError::Overloaded {
            model: model.to_string(),
            detail: "overloaded".to_string(),
        }
    }

    fn not_found(model: &str) -> ModelError {
        ModelError::NotFound {
            model: model.to_string(),
            status: 404,
            detail: "not found".to_string(),
        }
    }

    fn unauthorized(model: &str) -> ModelError {
        ModelError::Rejected {
            model: model.to_string(),
            status: 403,
            detail: "permission denied".to_string(),
        }
    }

    fn chain(models: &[&str]) -> FallbackChain {
        FallbackChain::new(
            models.iter().map(|m| m.to_string()).collect(),
            RetryPolicy::new(3, 1_000).expect("valid policy"),
        )
    }

    fn prompt() -> Prompt {
        Prompt::build("knowledge", "question")
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_model_success_makes_one_call() {
        let client = ScriptedClient::new().script("a", vec![Ok(GenerateContentResponse::from_text("hi"))]);

        let success = chain(&["a", "b"])
            .complete(&client, &prompt(), "req")
            .await
            .expect("should succeed");

        assert_eq!(success.model, "a");
        assert_eq!(client.calls(), vec!["a"]);
        assert_eq!(
            success.attempts,
            vec![ModelAttempt {
                model: "a".to_string(),
                attempt_index: 0,
                outcome: AttemptOutcome::Success,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overloaded_model_retried_then_next_model_used() {
        let client = ScriptedClient::new()
            .script("a", vec![Err(overloaded("a"))])
            .script("b", vec![Ok(GenerateContentResponse::from_text("from b"))]);
        let start = tokio::time::Instant::now();

        let success = chain(&["a", "b"])
            .complete(&client, &prompt(), "req")
            .await
            .expect("should succeed on b");

        assert_eq!(success.model, "b");
        assert_eq!(client.calls(), vec!["a", "a", "a", "b"]);
        // 1s + 2s backoff on model a, none after its final attempt
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(3_000));
        assert!(elapsed < std::time::Duration::from_millis(3_100));

        let outcomes: Vec<_> = success.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::RetryableFailure,
                AttemptOutcome::RetryableFailure,
                AttemptOutcome::RetryableFailure,
                AttemptOutcome::Success,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_advances_without_delay() {
        let client = ScriptedClient::new()
            .script("retired", vec![Err(not_found("retired"))])
            .script("current", vec![Ok(GenerateContentResponse::from_text("ok"))]);
        let start = tokio::time::Instant::now();

        let success = chain(&["retired", "current"])
            .complete(&client, &prompt(), "req")
            .await
            .expect("should succeed");

        assert_eq!(success.model, "current");
        assert_eq!(client.calls(), vec!["retired", "current"]);
        assert!(start.elapsed() < std::time::Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_aborts_chain() {
        let client = ScriptedClient::new()
            .script("a", vec![Err(unauthorized("a"))])
            .script("b", vec![Ok(GenerateContentResponse::from_text("never"))]);

        let err = chain(&["a", "b"])
            .complete(&client, &prompt(), "req")
            .await
            .expect_err("should abort");

        assert!(matches!(err, ChainError::Aborted { ref model, .. } if model == "a"));
        assert_eq!(client.calls(), vec!["a"]);
        assert_eq!(err.attempts()[0].outcome, AttemptOutcome::FatalFailure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_models_overloaded_exhausts_chain() {
        let client = ScriptedClient::new()
            .script("a", vec![Err(overloaded("a"))])
            .script("b", vec![Err(overloaded("b"))])
            .script("c", vec![Err(overloaded("c"))]);

        let err = chain(&["a", "b", "c"])
            .complete(&client, &prompt(), "req")
            .await
            .expect_err("should exhaust");

        assert_eq!(client.calls().len(), 9);
        assert_eq!(err.attempts().len(), 9);
        match err {
            ChainError::AllModelsExhausted { tried, last, .. } => {
                assert_eq!(tried, 3);
                assert_eq!(last.model(), "c");
            }
            other => panic!("expected AllModelsExhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_retry_budget() {
        let client = ScriptedClient::new().script(
            "a",
            vec![
                Err(overloaded("a")),
                Ok(GenerateContentResponse::from_text("second time lucky")),
            ],
        );

        let success = chain(&["a", "b"])
            .complete(&client, &prompt(), "req")
            .await
            .expect("should succeed on retry");

        assert_eq!(success.model, "a");
        assert_eq!(client.calls(), vec!["a", "a"]);
    }

    #[tokio::test]
    async fn test_empty_chain_reports_no_models() {
        let client = ScriptedClient::new();
        let err = FallbackChain::new(vec![], RetryPolicy::default())
            .complete(&client, &prompt(), "req")
            .await
            .expect_err("no models");
        assert!(matches!(err, ChainError::NoModels));
    }
}
