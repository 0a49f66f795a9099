//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Upstream credential status: "configured" or "missing"
    pub upstream_credential: &'static str,
    /// Number of models in the fallback chain
    pub models: usize,
}

/// Health check handler
///
/// Always 200 while the process is serving. A missing credential is reported
/// rather than failing the check, so operators can see why chat requests are
/// answering with the generic failure message.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let upstream_credential = if state.has_credential() {
        "configured"
    } else {
        "missing"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            upstream_credential,
            models: state.chain().models().len(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticListingStore;
    use crate::config::Config;
    use crate::models::{CompletionClient, GeminiClient};
    use std::str::FromStr;
    use std::sync::Arc;

    fn config() -> Arc<Config> {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
[[upstream.models]]
name = "gemini-2.5-flash"

[[upstream.models]]
name = "gemini-2.0-flash"

[[upstream.models]]
name = "gemini-1.5-flash"

[catalog]
hotels_path = "hotels.json"
packages_path = "packages.json"

[contact]
emails = ["info@example.com"]
phones = ["+254 700 000 000"]
address = "Nairobi"
"#;
        Arc::new(Config::from_str(toml).expect("should parse test config"))
    }

    #[tokio::test]
    async fn test_health_reports_missing_credential() {
        let state = AppState::with_components(config(), Arc::new(StaticListingStore::default()), None)
            .expect("should create AppState");

        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.upstream_credential, "missing");
        assert_eq!(body.models, 3);
    }

    #[tokio::test]
    async fn test_health_reports_configured_credential() {
        let config = config();
        let client: Arc<dyn CompletionClient> =
            Arc::new(GeminiClient::new(&config.upstream, "test-key").expect("client builds"));
        let state = AppState::with_components(
            config,
            Arc::new(StaticListingStore::default()),
            Some(client),
        )
        .expect("should create AppState");

        let (_, Json(body)) = handler(State(state)).await;
        assert_eq!(body.upstream_credential, "configured");
    }
}
