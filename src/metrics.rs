//! Prometheus metrics collection for the concierge gateway
//!
//! Tracks:
//! - Requests by terminal outcome
//! - Upstream attempts by model and attempt outcome
//! - End-to-end request latency
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::models::AttemptOutcome;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Terminal state of one chat request
///
/// Restricting labels to an enum keeps the `outcome` label cardinality fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 200 with model text
    Answered,
    /// 200 with the localized apology (model returned nothing usable)
    FallbackAnswer,
    /// 400
    BadInput,
    /// 500, upstream credential missing
    Misconfigured,
    /// 500, listing store read failed
    ContextUnavailable,
    /// 500, fallback chain aborted or exhausted
    GenericFailure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Answered => "answered",
            Outcome::FallbackAnswer => "fallback_answer",
            Outcome::BadInput => "bad_input",
            Outcome::Misconfigured => "misconfigured",
            Outcome::ContextUnavailable => "context_unavailable",
            Outcome::GenericFailure => "generic_failure",
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    model_attempts_total: IntCounterVec,
    request_duration: HistogramVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with its own registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 6 outcomes
        let requests_total = IntCounterVec::new(
            Opts::new(
                "concierge_requests_total",
                "Total number of chat requests by terminal outcome",
            ),
            &["outcome"],
        )?;

        // Cardinality: configured models × 3 outcomes
        let model_attempts_total = IntCounterVec::new(
            Opts::new(
                "concierge_model_attempts_total",
                "Total upstream generation attempts by model and attempt outcome",
            ),
            &["model", "outcome"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "concierge_request_duration_ms",
                "End-to-end chat request latency in milliseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
                60000.0,
            ]),
            &["outcome"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "concierge_metrics_recording_failures_total",
                "Total number of metrics recording operation failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(model_attempts_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            model_attempts_total,
            request_duration,
            metrics_recording_failures,
        })
    }

    /// Record one finished request
    pub fn record_request(&self, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record one upstream attempt
    pub fn record_model_attempt(
        &self,
        model: &str,
        outcome: AttemptOutcome,
    ) -> Result<(), prometheus::Error> {
        self.model_attempts_total
            .get_metric_with_label_values(&[model, outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record request latency
    ///
    /// # Errors
    ///
    /// Rejects NaN, infinite and negative durations; they would corrupt the
    /// histogram's percentiles.
    pub fn record_request_duration(
        &self,
        outcome: Outcome,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative (duration cannot be negative), got: {}",
                duration_ms
            )));
        }

        self.request_duration
            .get_metric_with_label_values(&[outcome.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Count a failed recording call; requests continue regardless
    pub fn metrics_recording_failure(&self, operation: &str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn metrics_recording_failures_count(&self) -> u64 {
        self.metrics_recording_failures
            .with_label_values(&["record_request"])
            .get()
            + self
                .metrics_recording_failures
                .with_label_values(&["record_model_attempt"])
                .get()
            + self
                .metrics_recording_failures
                .with_label_values(&["record_request_duration"])
                .get()
    }

    /// Current count for one request outcome
    pub fn requests_count(&self, outcome: Outcome) -> u64 {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Current attempt count for one model and outcome
    pub fn model_attempts_count(&self, model: &str, outcome: AttemptOutcome) -> u64 {
        self.model_attempts_total
            .with_label_values(&[model, outcome.as_str()])
            .get()
    }

    /// Gather all metrics and encode them in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                "Prometheus text encoder failed"
            );
            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();
            tracing::error!(
                invalid_byte_index = valid_up_to,
                "Prometheus encoder produced invalid UTF-8"
            );
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                valid_up_to, e
            ))
        })
    }
}
