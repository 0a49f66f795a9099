//! Command-line interface
//!
//! Provides argument parsing and subcommand handling for the binary.

use clap::{Parser, Subcommand};

/// Resilient completion gateway for travel questions
#[derive(Parser)]
#[command(name = "safari-concierge")]
#[command(version)]
#[command(about = "Resilient completion gateway for travel questions")]
#[command(
    long_about = "Safari Concierge answers travel questions from live hotel and package \
    listings, calling an upstream generation service through an ordered model fallback \
    chain with bounded retries."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Safari Concierge Configuration
# ==============================
#
# HTTP server, upstream generation service, fallback chain, listing data,
# contact details and logging.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM GENERATION SERVICE
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
base_url = "https://generativelanguage.googleapis.com"

# Environment variable holding the API key. The key itself never goes in
# this file. If the variable is unset, /api/chat answers with a generic
# failure and /health reports upstream_credential = "missing".
api_key_env = "GEMINI_API_KEY"

# Per-attempt timeout in seconds (1-300). A timed-out attempt is retried.
timeout_seconds = 30

# Sampling temperature (0.0-2.0) and response length cap
temperature = 0.4
max_output_tokens = 1024

# Fallback chain, best model first. Models are always tried in this order:
#   - success stops the chain
#   - "not found"/"not supported" skips to the next model immediately
#   - overloaded (503) / rate limited (429) is retried, then skipped
#   - any other error (e.g. bad credentials) aborts the request
[[upstream.models]]
name = "gemini-2.5-flash"

[[upstream.models]]
name = "gemini-2.0-flash"

[[upstream.models]]
name = "gemini-1.5-flash"

# ─────────────────────────────────────────────────────────────────────────────
# RETRY
# ─────────────────────────────────────────────────────────────────────────────

[retry]
# Attempts per model (>= 1). Backoff between attempts is
# base_delay_ms * 2^attempt (1s, 2s, ...), capped at 30s.
max_attempts = 3
base_delay_ms = 1000

# ─────────────────────────────────────────────────────────────────────────────
# KNOWLEDGE BLOCK
# ─────────────────────────────────────────────────────────────────────────────

[context]
# Cap on listing text included in each prompt. Whole lines beyond the cap
# are dropped; contact details are always included.
max_listing_chars = 12000

[catalog]
# JSON arrays maintained by the listings service, re-read on every request.
#   hotels:   [{"name": "...", "location": "...", "price": 80}]
#   packages: [{"title": "...", "description": "...", "price": 450}]
hotels_path = "data/hotels.json"
packages_path = "data/packages.json"

# ─────────────────────────────────────────────────────────────────────────────
# CONTACT DETAILS
# ─────────────────────────────────────────────────────────────────────────────
#
# Appended to every knowledge block and quoted in apology messages
# (the first email and phone are used there).

[contact]
emails = ["info@example.com"]
phones = ["+254 700 000 000"]
address = "Kenyatta Avenue, Nairobi, Kenya"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["safari-concierge"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["safari-concierge", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["safari-concierge", "config"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: None })
        ));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["safari-concierge", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_valid_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should load as a valid Config");
        assert_eq!(config.upstream.models().len(), 3);
        assert_eq!(config.upstream.api_key_env(), "GEMINI_API_KEY");
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[upstream]",
            "[[upstream.models]]",
            "[retry]",
            "[context]",
            "[catalog]",
            "[contact]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {}", section);
        }
    }
}
