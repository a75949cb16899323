//! Router property descriptors
//!
//! Hosts that configure the router through named string properties use these
//! descriptors to discover the supported settings, their defaults and their
//! validation rules.

use std::fmt;
use std::str::FromStr;

use crate::channel_set::ChannelCount;
use crate::config::AttributeName;
use crate::error::{Result, RoutingError};

/// A configurable router property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Attribute whose value keys routing
    AttributeName,
    /// Number of numbered output channels
    RelationshipsNumber,
}

impl Property {
    /// All supported properties, in display order
    pub const ALL: [Property; 2] = [Property::AttributeName, Property::RelationshipsNumber];

    /// Display name used by hosts
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AttributeName => "Attribute name",
            Self::RelationshipsNumber => "Relationships number",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::AttributeName => {
                "Records with the same value for this attribute are always routed to the same channel"
            }
            Self::RelationshipsNumber => "The number of numbered output channels to route to",
        }
    }

    pub const fn is_required(&self) -> bool {
        true
    }

    /// Default value applied when the property is unset
    pub const fn default_value(&self) -> Option<&'static str> {
        match self {
            Self::AttributeName => None,
            Self::RelationshipsNumber => Some("1"),
        }
    }

    /// Validate a candidate value without applying it
    pub fn validate(&self, value: &str) -> Result<()> {
        match self {
            Self::AttributeName => AttributeName::from_str(value).map(|_| ()),
            Self::RelationshipsNumber => ChannelCount::from_str(value).map(|_| ()),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| RoutingError::unknown_property(s))
    }
}
