//! Retry with exponential backoff
//!
//! A generic primitive: run an async operation up to `max_attempts` times,
//! sleeping `base_delay * 2^attempt_index` between attempts, and only when
//! the caller's classifier says the failure is retryable.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default maximum number of attempts per operation
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default base backoff in milliseconds (doubles each retry)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Maximum backoff duration in milliseconds (30 seconds)
///
/// Prevents runaway sleeps from exponential overflow with large attempt counts.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Retry schedule for a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1)
    max_attempts: usize,
    /// Base backoff in milliseconds
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Errors
    /// Returns an error if `max_attempts` is 0 (at least 1 attempt is required)
    pub fn new(max_attempts: usize, base_delay_ms: u64) -> Result<Self, &'static str> {
        if max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        Ok(Self {
            max_attempts,
            base_delay_ms,
        })
    }

    /// Get the maximum number of attempts
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Get the base backoff in milliseconds
    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    /// Backoff to sleep after the failed attempt with the given zero-based index
    pub fn backoff_for(&self, attempt_index: usize) -> Duration {
        Duration::from_millis(calculate_backoff(self, attempt_index))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

/// Calculate exponential backoff with overflow protection
///
/// The formula is `base * 2^attempt_index` (zero-based), capped at
/// [`MAX_BACKOFF_MS`].
///
/// # Examples
/// With base=1000ms:
/// - Attempt index 0: 1000ms
/// - Attempt index 1: 2000ms
/// - Attempt index 2: 4000ms
/// - Attempt index 5+: 30,000ms (capped)
pub fn calculate_backoff(policy: &RetryPolicy, attempt_index: usize) -> u64 {
    let exponent = u32::try_from(attempt_index).unwrap_or(u32::MAX);
    policy
        .base_delay_ms
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(MAX_BACKOFF_MS)
}

/// Run `operation` under `policy`, retrying only failures `is_retryable` accepts
///
/// The operation receives the zero-based attempt index. A non-retryable
/// failure, or a failure on the final allowed attempt, is returned unchanged.
/// The backoff is a `tokio::time::sleep` on the caller's task, so concurrent
/// requests are never blocked by one another's delays.
pub async fn execute<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt_index = 0;

    loop {
        match operation(attempt_index).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let is_final = attempt_index + 1 >= policy.max_attempts();
                if !is_retryable(&err) || is_final {
                    return Err(err);
                }

                let delay = policy.backoff_for(attempt_index);
                tracing::warn!(
                    attempt = attempt_index + 1,
                    max_attempts = policy.max_attempts(),
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retryable failure, backing off before next attempt"
                );
                tokio::time::sleep(delay).await;
                attempt_index += 1;
            }
        }
    }
}
