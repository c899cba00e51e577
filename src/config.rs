//! Runtime configuration.
//!
//! Read from an optional TOML file; every key has a default so a missing file
//! (or a missing section) is fine.  `NEWSFEED_API_BASE` and `NEWSFEED_TOKEN`
//! override the file.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "newsfeed.toml";

const ENV_API_BASE: &str = "NEWSFEED_API_BASE";
const ENV_TOKEN: &str = "NEWSFEED_TOKEN";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedConfig {
    /// Articles revealed per load-more.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Articles fetched for one shuffled batch.
    #[serde(default = "default_random_batch_size")]
    pub random_batch_size: usize,
    #[serde(default)]
    pub smart_filter: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_ms() -> u64 { 10_000 }
fn default_page_size() -> usize { 10 }
fn default_random_batch_size() -> usize { 100 }
fn default_log_file() -> String {
    "psx-newsfeed.log".to_string()
}
fn default_log_filter() -> String {
    "psx_newsfeed=info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            random_batch_size: default_random_batch_size(),
            smart_filter: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load `path` if it exists, otherwise start from defaults.  Then apply
    /// environment overrides, then `cli_api_base` (which wins), and
    /// validate the result.
    pub fn load(path: &Path, cli_api_base: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(
            std::env::var(ENV_API_BASE).ok(),
            std::env::var(ENV_TOKEN).ok(),
        );
        config.apply_overrides(cli_api_base, None);
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Empty values are treated as unset.
    pub fn apply_overrides(&mut self, api_base: Option<String>, token: Option<String>) {
        if let Some(base) = api_base.filter(|v| !v.trim().is_empty()) {
            self.api.base_url = base.trim().to_string();
        }
        if let Some(token) = token.filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token.trim().to_string());
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.feed.page_size >= 1, "feed.page_size must be at least 1");
        ensure!(
            self.feed.random_batch_size >= self.feed.page_size,
            "feed.random_batch_size ({}) must not be smaller than feed.page_size ({})",
            self.feed.random_batch_size,
            self.feed.page_size
        );
        ensure!(
            self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"),
            "api.base_url must be an http(s) URL, got {:?}",
            self.api.base_url
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.random_batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://psx.example.com"

            [feed]
            page_size = 20
            smart_filter = true
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://psx.example.com");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.feed.page_size, 20);
        assert_eq!(config.feed.random_batch_size, 100);
        assert!(config.feed.smart_filter);
        assert_eq!(config.log.file, "psx-newsfeed.log");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::parse("[feed]\npage_size = \"ten\"").is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://10.0.0.5:8000".into()), Some(" secret ".into()));
        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".into()), Some(String::new()));
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert!(config.api.token.is_none());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_batch_smaller_than_page() {
        let mut config = Config::default();
        config.feed.page_size = 50;
        config.feed.random_batch_size = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_base() {
        let mut config = Config::default();
        config.api.base_url = "localhost:8000".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/newsfeed.toml"), None).unwrap();
        assert_eq!(config.feed, FeedConfig::default());
    }

    #[test]
    fn cli_api_base_wins_and_is_validated() {
        let path = Path::new("/nonexistent/newsfeed.toml");
        let config = Config::load(path, Some("https://cli.example".into())).unwrap();
        assert_eq!(config.api.base_url, "https://cli.example");

        assert!(Config::load(path, Some("cli.example".into())).is_err());
    }
}
