//! Application settings loading from config.toml
//!
//! Settings cover the background sweeper and the external analysis service.
//! Every field has a default, so a missing file or a partial file is fine;
//! only a file that cannot be read or parsed is an error.

use crate::core::schedule::SchedulePolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Review scheduling and background sweep settings
    pub scheduler: SchedulerConfig,
    /// External price analysis settings
    pub analysis: AnalysisConfig,
}

/// `[scheduler]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two background sweeps
    pub sweep_interval_secs: u64,
    /// How unknown interval labels are treated when scheduling reviews
    pub schedule_policy: SchedulePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60 * 60,
            schedule_policy: SchedulePolicy::Lenient,
        }
    }
}

impl SchedulerConfig {
    /// Sweep interval as a [`Duration`]
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of an OpenAI-compatible API, including `/v1`
    pub base_url: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Extra attempts after the first failed request
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub retry_backoff_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML is invalid or `sweep_interval_secs` is zero.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.scheduler.sweep_interval_secs == 0 {
        return Err(Error::Config {
            message: "scheduler.sweep_interval_secs must be at least 1".to_string(),
        });
    }
    Ok(config)
}

/// Loads settings from `path`, falling back to defaults when the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_config(path_ref)
    } else {
        tracing::info!(
            "No config file at {}, using default settings",
            path_ref.display()
        );
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [scheduler]
            sweep_interval_secs = 120
            schedule_policy = "strict"

            [analysis]
            base_url = "http://localhost:8080/v1"
            model = "local-model"
            timeout_secs = 5
            max_retries = 0
            retry_backoff_ms = 10
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.scheduler.sweep_interval(), Duration::from_secs(120));
        assert_eq!(config.scheduler.schedule_policy, SchedulePolicy::Strict);
        assert_eq!(config.analysis.base_url, "http://localhost:8080/v1");
        assert_eq!(config.analysis.model, "local-model");
        assert_eq!(config.analysis.max_retries, 0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("[scheduler]\nsweep_interval_secs = 60\n").unwrap();
        assert_eq!(config.scheduler.sweep_interval_secs, 60);
        assert_eq!(config.scheduler.schedule_policy, SchedulePolicy::Lenient);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scheduler.sweep_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_policy_is_config_error() {
        let result = parse_config("[scheduler]\nschedule_policy = \"sometimes\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_sweep_interval_is_config_error() {
        let result = parse_config("[scheduler]\nsweep_interval_secs = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config { message }) if message.contains("sweep_interval_secs")
        ));

        let config = parse_config("[scheduler]\nsweep_interval_secs = 1\n").unwrap();
        assert_eq!(config.scheduler.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config_or_default("does/not/exist/config.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
