//! Tracing bootstrap.
//!
//! The terminal belongs to the UI, so log lines go to a file instead of
//! stdout.

use std::fs::File;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `log.filter` from the config.
pub fn init(config: &LogConfig) -> Result<()> {
    let file = File::create(&config.file)
        .with_context(|| format!("failed to create log file {}", config.file))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn filter(config: &LogConfig) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), config)
}

/// A blank or unparsable `RUST_LOG` falls back to the configured directive.
fn filter_from(env: Option<&str>, config: &LogConfig) -> EnvFilter {
    env.filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_config(file: &str) -> LogConfig {
        LogConfig {
            file: file.to_string(),
            filter: "psx_newsfeed=debug".to_string(),
        }
    }

    #[test]
    fn unset_env_uses_configured_filter() {
        let config = log_config("unused.log");
        assert_eq!(filter_from(None, &config).to_string(), "psx_newsfeed=debug");
        assert_eq!(filter_from(Some("  "), &config).to_string(), "psx_newsfeed=debug");
    }

    #[test]
    fn env_filter_wins_over_config() {
        let config = log_config("unused.log");
        assert_eq!(filter_from(Some("warn"), &config).to_string(), "warn");
    }

    #[test]
    fn unparsable_env_falls_back_to_config() {
        let config = log_config("unused.log");
        let filter = filter_from(Some("psx_newsfeed=notalevel"), &config);
        assert_eq!(filter.to_string(), "psx_newsfeed=debug");
    }

    #[test]
    fn init_creates_log_file_once() {
        let path = std::env::temp_dir().join(format!("psx-newsfeed-{}.log", std::process::id()));
        let config = log_config(&path.to_string_lossy());

        assert!(init(&config).is_ok());
        assert!(path.exists());
        tracing::info!("logging initialised");

        // A second global subscriber is refused.
        assert!(init(&config).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
