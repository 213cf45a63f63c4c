use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::vision_client::VisionSettings;

const DEFAULT_VISION_API_URL: &str = "https://api.replicate.com/v1";
const DEFAULT_VISION_MODEL: &str = "openai/gpt-4o";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable has a default; startup fails only on unparsable values.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub vision_api_url: String,
    /// Unset means the URL points at an authenticating relay.
    pub vision_api_token: Option<String>,
    pub vision_model: String,
    pub vision_poll_interval: Duration,
    pub vision_timeout: Duration,
    /// `Family:Style` entries the font library can load.
    pub available_fonts: Vec<String>,
    pub artboard_gap: f64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            vision_api_url: std::env::var("VISION_API_URL")
                .unwrap_or_else(|_| DEFAULT_VISION_API_URL.to_string()),
            vision_api_token: std::env::var("VISION_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            vision_model: std::env::var("VISION_MODEL")
                .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string()),
            vision_poll_interval: Duration::from_millis(parse_env("VISION_POLL_INTERVAL_MS", 1500)?),
            vision_timeout: Duration::from_secs(parse_env("VISION_TIMEOUT_SECS", 180)?),
            available_fonts: std::env::var("AVAILABLE_FONTS")
                .map(|fonts| split_list(&fonts))
                .unwrap_or_default(),
            artboard_gap: parse_env("ARTBOARD_GAP", 100.0)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn vision_settings(&self) -> VisionSettings {
        VisionSettings {
            base_url: self.vision_api_url.clone(),
            api_token: self.vision_api_token.clone(),
            model: self.vision_model.clone(),
            poll_interval: self.vision_poll_interval,
            timeout: self.vision_timeout,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_skips_blank_entries() {
        assert_eq!(
            split_list(" Inter:Regular, ,Roboto:Bold ,"),
            vec!["Inter:Regular".to_string(), "Roboto:Bold".to_string()]
        );
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("ADGEN_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
