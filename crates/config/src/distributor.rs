//! Distributor configuration
//!
//! The routing attribute and the number of numbered output channels.
//!
//! # Example
//!
//! ```toml
//! [distributor]
//! attribute_name = "tenant_id"
//! channel_count = 4
//! ```
//!
//! `channel_count` also accepts a string (`channel_count = "4"`), the form
//! hosts that pass properties as text produce.

use distributor_routing::{AttributeName, ChannelCount, RoutingConfig};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

const SECTION: &str = "distributor";

/// Raw channel count as written in the config file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChannelCountValue {
    /// `channel_count = 4`
    Integer(i64),
    /// `channel_count = "4"`
    Text(String),
}

impl Default for ChannelCountValue {
    fn default() -> Self {
        Self::Integer(i64::from(ChannelCount::DEFAULT.get()))
    }
}

impl ChannelCountValue {
    /// Parse into a validated channel count
    pub fn parse(&self) -> Result<ChannelCount> {
        let parsed = match self {
            Self::Integer(n) => n.to_string().parse::<ChannelCount>(),
            Self::Text(s) => s.parse::<ChannelCount>(),
        };
        parsed.map_err(|e| ConfigError::invalid_value(SECTION, "channel_count", e.to_string()))
    }
}

/// Distributor section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DistributorConfig {
    /// Attribute whose value selects the output channel
    /// Required to route; may be supplied on the command line instead
    pub attribute_name: Option<String>,

    /// Number of numbered output channels
    /// Default: 1
    pub channel_count: ChannelCountValue,
}

impl DistributorConfig {
    /// Validated attribute name, if one is set
    pub fn attribute_name(&self) -> Result<Option<AttributeName>> {
        self.attribute_name
            .as_deref()
            .map(|name| {
                AttributeName::new(name).map_err(|e| {
                    ConfigError::invalid_value(SECTION, "attribute_name", e.to_string())
                })
            })
            .transpose()
    }

    /// Validated channel count
    pub fn channel_count(&self) -> Result<ChannelCount> {
        self.channel_count.parse()
    }

    /// Complete routing configuration
    ///
    /// # Errors
    ///
    /// Fails if `attribute_name` is absent or either value is invalid.
    pub fn routing_config(&self) -> Result<RoutingConfig> {
        let attribute_name = self
            .attribute_name()?
            .ok_or_else(|| ConfigError::missing_field(SECTION, "attribute_name"))?;

        Ok(RoutingConfig {
            attribute_name,
            channel_count: self.channel_count()?,
        })
    }

    /// Check both values without building a routing config
    pub(crate) fn validate(&self) -> Result<()> {
        self.attribute_name()?;
        self.channel_count()?;
        Ok(())
    }
}
