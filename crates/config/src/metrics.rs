//! Metrics reporting configuration
//!
//! Controls periodic dispatch metrics reports while records are flowing.
//! A final summary is always logged when the input ends.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Metrics output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON structured output
    Json,
}

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "30s"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable periodic reports
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Output format (human, json)
    /// Default: human
    pub format: MetricsFormat,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::Human,
        }
    }
}

impl MetricsConfig {
    /// Interval to report on, `None` when periodic reports are off
    pub fn report_interval(&self) -> Option<Duration> {
        self.enabled.then_some(self.interval)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.enabled && self.interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "metrics",
                "interval",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.format, MetricsFormat::Human);
        assert_eq!(config.report_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_deserialize_disabled() {
        let config: MetricsConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.report_interval(), None);
    }

    #[test]
    fn test_deserialize_interval_variants() {
        for (s, expected) in [
            ("100ms", Duration::from_millis(100)),
            ("1s", Duration::from_secs(1)),
            ("5m", Duration::from_secs(300)),
        ] {
            let toml = format!("interval = \"{}\"", s);
            let config: MetricsConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config.interval, expected, "Failed for {}", s);
        }
    }

    #[test]
    fn test_format_variants() {
        let json: MetricsConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(json.format, MetricsFormat::Json);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config: MetricsConfig = toml::from_str("interval = \"0s\"").unwrap();
        assert!(config.validate().is_err());

        let disabled: MetricsConfig =
            toml::from_str("enabled = false\ninterval = \"0s\"").unwrap();
        assert!(disabled.validate().is_ok());
    }
}
