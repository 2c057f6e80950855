use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::GenerationSettings;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
///
/// Only malformed values are fatal. A missing `OPENAI_API_KEY` is allowed so the
/// server can still start; generation then fails with an auth error.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub generation: GenerationSettings,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = GenerationSettings::default();

        let max_attempts = non_zero(
            "GENERATION_MAX_ATTEMPTS",
            parse_env("GENERATION_MAX_ATTEMPTS", defaults.max_attempts)?,
        )?;

        let temperature: f32 = parse_env("GENERATION_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("GENERATION_TEMPERATURE must be between 0 and 2");
        }

        let timeout_secs = non_zero(
            "GENERATION_TIMEOUT_SECS",
            parse_env("GENERATION_TIMEOUT_SECS", defaults.request_timeout.as_secs())?,
        )?;

        let generation = GenerationSettings {
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| defaults.model.clone()),
            temperature,
            max_output_tokens: parse_env(
                "GENERATION_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            )?,
            request_timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            ..defaults
        };

        Ok(Config {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            generation,
            port: parse_env("PORT", 3001)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Rejects a zero count or duration.
fn non_zero<T>(key: &str, value: T) -> Result<T>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        bail!("{key} must be at least 1");
    }
    Ok(value)
}
