//! Upstream model access
//!
//! `client` talks to the generation service; `chain` walks the ordered model
//! list with retries and fallback.

pub mod chain;
pub mod client;

pub use chain::{AttemptOutcome, ChainError, ChainSuccess, FallbackChain, ModelAttempt};
pub use client::{
    Candidate, CompletionClient, Content, GeminiClient, GenerateContentResponse, Part,
};
