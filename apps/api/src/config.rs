use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const DEFAULT_LLM_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_REVIEW_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PORT: u16 = 3000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub review_model: String,
    /// Ceiling for the single outbound completion call.
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_timeout_secs = parse_or_default(
            "LLM_TIMEOUT_SECS",
            std::env::var("LLM_TIMEOUT_SECS").ok(),
            DEFAULT_LLM_TIMEOUT_SECS,
        )?;
        if llm_timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            review_model: env_or("LLM_REVIEW_MODEL", DEFAULT_REVIEW_MODEL),
            llm_timeout_secs,
            port: parse_or_default("PORT", std::env::var("PORT").ok(), DEFAULT_PORT)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
        None => Ok(default),
    }
}
