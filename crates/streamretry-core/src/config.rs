use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryConfig;

/// Invalid values in the config file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("retry.max_attempts must be at least 1 (got {0})")]
    ZeroAttempts(u32),
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum number of attempts per call (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Retry every error, not only rate limits.
    pub retry_all_errors: bool,
    /// Status codes treated as rate limiting (e.g. add 529 for "overloaded").
    pub rate_limit_statuses: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetrySettings {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: duration_millis(config.base_delay),
            max_delay_ms: duration_millis(config.max_delay),
            retry_all_errors: config.retry_all_errors,
            rate_limit_statuses: config.rate_limit_statuses.clone(),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> Result<RetryConfig, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts(self.max_attempts));
        }
        Ok(RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            retry_all_errors: self.retry_all_errors,
            rate_limit_statuses: self.rate_limit_statuses.clone(),
        })
    }
}

/// Global configuration loaded from `~/.config/streamretry/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRetryConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetrySettings>,
}

impl StreamRetryConfig {
    /// Retry policy from the `[retry]` section, or the defaults.
    pub fn retry_config(&self) -> Result<RetryConfig, ConfigError> {
        match &self.retry {
            Some(settings) => settings.to_retry_config(),
            None => Ok(RetryConfig::default()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("streamretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StreamRetryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StreamRetryConfig {
            retry: Some(RetrySettings::default()),
        };
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<StreamRetryConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: StreamRetryConfig = toml::from_str(&data)?;
    cfg.retry_config()?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = StreamRetryConfig::default();
        assert!(cfg.retry.is_none());
        let retry = cfg.retry_config().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(1000));
        assert_eq!(retry.max_delay, Duration::from_millis(10_000));
        assert!(!retry.retry_all_errors);
        assert_eq!(retry.rate_limit_statuses, vec![429]);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = StreamRetryConfig {
            retry: Some(RetrySettings::default()),
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: StreamRetryConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_retry() {
        let toml = r#"
            [retry]
            max_attempts = 5
            base_delay_ms = 250
            max_delay_ms = 4000
            retry_all_errors = true
            rate_limit_statuses = [429, 529]
        "#;
        let cfg: StreamRetryConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry_config().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_millis(4000));
        assert!(retry.retry_all_errors);
        assert!(retry.is_rate_limit_status(529));
    }

    #[test]
    fn config_toml_partial_retry_section_uses_defaults() {
        let toml = r#"
            [retry]
            max_attempts = 7
        "#;
        let cfg: StreamRetryConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry_config().unwrap();
        assert_eq!(retry.max_attempts, 7);
        assert_eq!(retry.base_delay, Duration::from_millis(1000));
        assert_eq!(retry.rate_limit_statuses, vec![429]);
    }

    #[test]
    fn zero_attempts_rejected() {
        let toml = r#"
            [retry]
            max_attempts = 0
        "#;
        let cfg: StreamRetryConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.retry_config(), Err(ConfigError::ZeroAttempts(0)));
    }

    #[test]
    fn settings_from_config_saturate_huge_delays() {
        let retry = RetryConfig::default()
            .with_base_delay(Duration::from_millis(250))
            .with_max_delay(Duration::MAX);
        let settings = RetrySettings::from(&retry);
        assert_eq!(settings.base_delay_ms, 250);
        assert_eq!(settings.max_delay_ms, u64::MAX);
        assert_eq!(settings.rate_limit_statuses, vec![429]);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = 2\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.retry_config().unwrap().max_attempts, 2);

        fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();
        assert!(load_from(&path).is_err());
    }
}
