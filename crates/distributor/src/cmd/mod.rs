//! Command implementations for the distributor CLI

pub mod channels;
pub mod hash;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use distributor_config::Config;
use distributor_routing::{AttributeName, ChannelCount, RoutingConfig};

/// Config files tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/distributor.toml", "distributor.toml"];

/// Load the configuration file
///
/// An explicit path must exist. Without one, the default paths are tried and
/// built-in defaults are used if none exists.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            return Config::from_file(&candidate).with_context(|| {
                format!("failed to load configuration from {}", candidate.display())
            });
        }
    }

    Ok(Config::default())
}

/// Routing overrides shared by the commands
#[derive(Args, Debug, Default, Clone)]
pub struct RoutingArgs {
    /// Routing attribute; overrides [distributor] attribute_name
    #[arg(short, long)]
    pub attribute: Option<String>,

    /// Number of numbered channels; overrides [distributor] channel_count
    #[arg(long)]
    pub channels: Option<String>,
}

impl RoutingArgs {
    /// Effective channel count
    pub fn channel_count(&self, config: &Config) -> Result<ChannelCount> {
        match &self.channels {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid --channels value '{}'", value)),
            None => Ok(config.distributor.channel_count()?),
        }
    }

    /// Effective routing attribute, if any
    pub fn attribute_name(&self, config: &Config) -> Result<Option<AttributeName>> {
        match &self.attribute {
            Some(value) => Ok(Some(
                value.parse().context("invalid --attribute value")?,
            )),
            None => Ok(config.distributor.attribute_name()?),
        }
    }

    /// Complete routing configuration
    pub fn routing_config(&self, config: &Config) -> Result<RoutingConfig> {
        let Some(attribute_name) = self.attribute_name(config)? else {
            bail!(
                "no routing attribute configured: set [distributor] attribute_name or pass --attribute"
            );
        };

        Ok(RoutingConfig {
            attribute_name,
            channel_count: self.channel_count(config)?,
        })
    }
}
