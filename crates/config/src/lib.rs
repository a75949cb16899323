//! Distributor Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the routing attribute has to be specified.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use distributor_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[distributor]\nattribute_name = \"tenant\"").unwrap();
//! assert_eq!(config.distributor.channel_count().unwrap().get(), 1);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [distributor]
//! attribute_name = "tenant"
//! channel_count = 4
//!
//! [pipeline]
//! queue_size = 1000
//! blocking = true
//!
//! [metrics]
//! interval = "60s"
//!
//! [log]
//! level = "info"
//! format = "console"
//! output = "stderr"
//! ```

mod distributor;
mod error;
mod logging;
mod metrics;
mod pipeline;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use distributor::{ChannelCountValue, DistributorConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use pipeline::{DEFAULT_QUEUE_SIZE, PipelineConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Routing attribute and channel count
    pub distributor: DistributorConfig,

    /// Output queue settings
    pub pipeline: PipelineConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
