//! Shared utilities used across the gateway
//!
//! Holds the generic retry-with-backoff primitive used by the model
//! fallback chain.

pub mod retry;
