use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ASSETS_DIR: &str = "data";
const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Startup aborts if `OPENAI_API_KEY` is missing or any value fails to parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub port: u16,
    /// `None` accepts any origin.
    pub cors_allowed_origin: Option<HeaderValue>,
    pub assets_dir: PathBuf,
    pub completion_api_url: String,
    pub completion_timeout: Duration,
}

impl Config {
    /// Reads the process environment. `main` loads `.env` before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'OPENAI_API_KEY' is not set")?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN")
            .filter(|v| !v.trim().is_empty())
            .map(|raw| {
                HeaderValue::from_str(raw.trim())
                    .with_context(|| format!("CORS_ALLOWED_ORIGIN is not a valid origin: '{raw}'"))
            })
            .transpose()?;

        let completion_timeout_secs = match lookup("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("COMPLETION_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'")
            })?,
            None => DEFAULT_COMPLETION_TIMEOUT_SECS,
        };

        Ok(Config {
            openai_api_key,
            port,
            cors_allowed_origin,
            assets_dir: lookup("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
            completion_api_url: lookup("COMPLETION_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_API_URL.to_string()),
            completion_timeout: Duration::from_secs(completion_timeout_secs),
        })
    }
}
