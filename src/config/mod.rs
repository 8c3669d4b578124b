//! Collector configuration.
//!
//! Loaded from TOML by the pipeline wiring. Validation is fail-closed: a
//! cache TTL that does not comfortably outlast the poll interval would evict
//! rate baselines between polls and silence every counter-backed metric, so
//! such configurations are rejected at parse time rather than degrading
//! quietly at runtime.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_sweep_interval_secs() -> u64 {
    30
}

/// Configuration for a [`MetricCollector`](crate::collector::MetricCollector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Expected spacing between stats polls, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Idle lifetime of a rate-cache entry, in seconds. Must be at least
    /// twice the poll interval so baselines survive a missed poll.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Minimum spacing between rate-cache eviction sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CollectorConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the poll interval is zero or
    /// the cache TTL is less than twice the poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.cache_ttl_secs < self.poll_interval_secs.saturating_mul(2) {
            return Err(ConfigError::Validation(format!(
                "cache_ttl_secs ({}) must be at least twice poll_interval_secs ({}) \
                 so rate baselines survive between polls",
                self.cache_ttl_secs, self.poll_interval_secs
            )));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Cache TTL as a [`Duration`].
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Sweep interval as a [`Duration`].
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CollectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_parse_with_defaults() {
        let config = CollectorConfig::from_toml("poll_interval_secs = 30").unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.cache_ttl_secs, default_cache_ttl_secs());
        assert_eq!(config.sweep_interval_secs, default_sweep_interval_secs());
    }

    #[test]
    fn test_ttl_below_two_polls_is_rejected() {
        let result = CollectorConfig::from_toml(
            "poll_interval_secs = 60\ncache_ttl_secs = 90",
        );
        assert!(matches!(
            result,
            Err(ConfigError::Validation(reason)) if reason.contains("twice")
        ));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let result = CollectorConfig::from_toml("poll_interval_secs = 0");
        assert!(matches!(
            result,
            Err(ConfigError::Validation(reason)) if reason.contains("non-zero")
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CollectorConfig {
            poll_interval_secs: 15,
            cache_ttl_secs: 120,
            sweep_interval_secs: 10,
        };
        let rendered = config.to_toml().unwrap();
        let parsed = CollectorConfig::from_toml(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.toml");
        std::fs::write(&path, "poll_interval_secs = 10\ncache_ttl_secs = 60\n").unwrap();

        let config = CollectorConfig::from_file(&path).unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.cache_ttl_secs, 60);

        let missing = CollectorConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
