//! Configuration management for the concierge gateway
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::catalog::ContactBlock;
use crate::context::DEFAULT_MAX_LISTING_CHARS;
use crate::error::{AppError, AppResult};
use crate::shared::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub context: ContextConfig,
    pub catalog: CatalogConfig,
    pub contact: ContactBlock,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream generation service configuration
///
/// Fields are private so validated values cannot be mutated after
/// `Config::validate()` has run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    /// Per-attempt timeout enforced by the HTTP client
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    max_output_tokens: u32,
    /// Fallback chain order: best model first
    models: Vec<ModelEntry>,
}

impl UpstreamConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    /// Model identifiers in configured order
    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}

/// One entry in the ordered model list
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModelEntry {
    name: String,
}

impl ModelEntry {
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_temperature() -> f64 {
    0.4
}

fn default_max_output_tokens() -> u32 {
    1024
}

/// Retry schedule applied to each model in the fallback chain
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Build the validated retry policy
    pub fn policy(&self) -> AppResult<RetryPolicy> {
        RetryPolicy::new(self.max_attempts, self.base_delay_ms)
            .map_err(|e| AppError::Config(format!("retry.{}", e)))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

/// Knowledge block settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_listing_chars")]
    pub max_listing_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_listing_chars: default_max_listing_chars(),
        }
    }
}

fn default_max_listing_chars() -> usize {
    DEFAULT_MAX_LISTING_CHARS
}

/// Location of the collaborator's listing files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub hotels_path: PathBuf,
    pub packages_path: PathBuf,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called automatically by `from_file()` and `from_str()`.
    pub fn validate(&self) -> AppResult<()> {
        let upstream = &self.upstream;

        if upstream.models.is_empty() {
            return Err(AppError::Config(
                "upstream.models has no entries. At least one model is required.\n\n\
                Example fix - add to config.toml:\n\
                [[upstream.models]]\n\
                name = \"gemini-2.5-flash\""
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for model in &upstream.models {
            if model.name.trim().is_empty() {
                return Err(AppError::Config(
                    "upstream.models contains an entry with an empty name".to_string(),
                ));
            }
            if !seen.insert(model.name.as_str()) {
                return Err(AppError::Config(format!(
                    "upstream.models lists '{}' more than once. Each model may appear only once \
                    in the fallback chain.",
                    model.name
                )));
            }
        }

        if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "upstream.base_url '{}' must start with 'http://' or 'https://'",
                upstream.base_url
            )));
        }

        if upstream.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "upstream.api_key_env must name an environment variable".to_string(),
            ));
        }

        if upstream.timeout_seconds == 0 {
            return Err(AppError::Config(
                "upstream.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if upstream.timeout_seconds > 300 {
            return Err(AppError::Config(format!(
                "upstream.timeout_seconds cannot exceed 300 seconds (5 minutes), got {}",
                upstream.timeout_seconds
            )));
        }

        if !upstream.temperature.is_finite()
            || upstream.temperature < 0.0
            || upstream.temperature > 2.0
        {
            return Err(AppError::Config(format!(
                "upstream.temperature must be a finite number between 0.0 and 2.0, got {}",
                upstream.temperature
            )));
        }

        if upstream.max_output_tokens == 0 {
            return Err(AppError::Config(
                "upstream.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        self.retry.policy()?;

        if self.contact.emails.is_empty() {
            return Err(AppError::Config(
                "contact.emails must list at least one address".to_string(),
            ));
        }
        if self.contact.phones.is_empty() {
            return Err(AppError::Config(
                "contact.phones must list at least one number".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[upstream]
base_url = "https://generativelanguage.googleapis.com"
api_key_env = "GEMINI_API_KEY"
timeout_seconds = 20
temperature = 0.3
max_output_tokens = 800

[[upstream.models]]
name = "gemini-2.5-flash"

[[upstream.models]]
name = "gemini-2.0-flash"

[[upstream.models]]
name = "gemini-1.5-flash"

[retry]
max_attempts = 3
base_delay_ms = 1000

[context]
max_listing_chars = 8000

[catalog]
hotels_path = "data/hotels.json"
packages_path = "data/packages.json"

[contact]
emails = ["info@example.com"]
phones = ["+254 700 000 000"]
address = "Kenyatta Avenue, Nairobi"

[observability]
log_level = "debug"
"#;

    const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[upstream]
[[upstream.models]]
name = "gemini-2.5-flash"

[catalog]
hotels_path = "hotels.json"
packages_path = "packages.json"

[contact]
emails = ["info@example.com"]
phones = ["+254 700 000 000"]
address = "Nairobi"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upstream.timeout_seconds(), 20);
        assert_eq!(config.upstream.temperature(), 0.3);
        assert_eq!(config.upstream.max_output_tokens(), 800);
        assert_eq!(config.context.max_listing_chars, 8000);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_models_keep_configured_order() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(
            config.upstream.model_names(),
            vec!["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"]
        );
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        assert_eq!(
            config.upstream.base_url(),
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.upstream.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.upstream.timeout_seconds(), 30);
        assert_eq!(config.retry.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.retry.base_delay_ms, DEFAULT_BASE_DELAY_MS);
        assert_eq!(config.context.max_listing_chars, DEFAULT_MAX_LISTING_CHARS);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_retry_policy_built_from_config() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        let policy = config.retry.policy().expect("valid policy");
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay_ms(), 1000);
    }

    #[test]
    fn test_validation_rejects_empty_model_list() {
        let toml = MINIMAL_CONFIG.replace(
            "[[upstream.models]]\nname = \"gemini-2.5-flash\"",
            "models = []",
        );
        let err = Config::from_str(&toml).expect_err("should reject empty models");
        assert!(err.to_string().contains("upstream.models"));
    }

    #[test]
    fn test_validation_rejects_duplicate_models() {
        let toml = MINIMAL_CONFIG.replace(
            "[[upstream.models]]\nname = \"gemini-2.5-flash\"",
            "[[upstream.models]]\nname = \"gemini-2.5-flash\"\n\n[[upstream.models]]\nname = \"gemini-2.5-flash\"",
        );
        let err = Config::from_str(&toml).expect_err("should reject duplicate models");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let toml = MINIMAL_CONFIG.replace("[upstream]", "[upstream]\nbase_url = \"ftp://example.com\"");
        let err = Config::from_str(&toml).expect_err("should reject ftp base_url");
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_validation_rejects_timeout_out_of_range() {
        for timeout in [0, 301] {
            let toml = MINIMAL_CONFIG.replace(
                "[upstream]",
                &format!("[upstream]\ntimeout_seconds = {}", timeout),
            );
            let err = Config::from_str(&toml).expect_err("should reject timeout");
            assert!(err.to_string().contains("timeout_seconds"));
        }
    }

    #[test]
    fn test_validation_rejects_temperature_out_of_range() {
        let toml = MINIMAL_CONFIG.replace("[upstream]", "[upstream]\ntemperature = 2.5");
        let err = Config::from_str(&toml).expect_err("should reject temperature");
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let toml = format!("{}\n[retry]\nmax_attempts = 0\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).expect_err("should reject zero attempts");
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validation_requires_contact_email_and_phone() {
        let no_email = MINIMAL_CONFIG.replace("emails = [\"info@example.com\"]", "emails = []");
        let err = Config::from_str(&no_email).expect_err("should reject missing email");
        assert!(err.to_string().contains("contact.emails"));

        let no_phone = MINIMAL_CONFIG.replace("phones = [\"+254 700 000 000\"]", "phones = []");
        let err = Config::from_str(&no_phone).expect_err("should reject missing phone");
        assert!(err.to_string().contains("contact.phones"));
    }

    #[test]
    fn test_missing_catalog_section_is_parse_error() {
        let toml = MINIMAL_CONFIG.replace(
            "[catalog]\nhotels_path = \"hotels.json\"\npackages_path = \"packages.json\"",
            "",
        );
        let err = Config::from_str(&toml).expect_err("should reject missing catalog");
        assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    }
}
