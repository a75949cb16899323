//! Routing configuration values
//!
//! Validated forms of the two router settings. Construction is the only place
//! validation happens, so a `RoutingConfig` in hand is always applicable.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::channel_set::ChannelCount;
use crate::error::{Result, RoutingError};

/// Name of the record attribute that keys routing
///
/// Must be non-empty. Whitespace is significant and kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeName(String);

impl AttributeName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RoutingError::EmptyAttributeName);
        }
        Ok(Self(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for AttributeName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AttributeName {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Complete router configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Attribute whose value selects the channel
    pub attribute_name: AttributeName,

    /// Number of numbered channels
    pub channel_count: ChannelCount,
}

impl RoutingConfig {
    /// Build a config from raw values, validating both
    pub fn new(attribute_name: impl Into<String>, channel_count: u32) -> Result<Self> {
        Ok(Self {
            attribute_name: AttributeName::new(attribute_name)?,
            channel_count: ChannelCount::new(channel_count)?,
        })
    }

    /// Build a config from property strings, as a host would supply them
    pub fn parse(attribute_name: &str, channel_count: &str) -> Result<Self> {
        Ok(Self {
            attribute_name: attribute_name.parse()?,
            channel_count: channel_count.parse()?,
        })
    }
}
