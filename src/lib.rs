//! Safari Concierge - resilient completion gateway for travel questions
//!
//! Grounds each user question in a live snapshot of hotel and package
//! listings, then obtains an answer from an unreliable upstream generation
//! service through an ordered model fallback chain with bounded retries.
//! Callers always get a safe, user-appropriate answer; upstream error detail
//! never leaves the server.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod prompt;
pub mod response;
pub mod shared;
pub mod telemetry;
