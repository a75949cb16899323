//! Routing error types

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised by configuration changes and routing requests
///
/// A record missing its routing attribute is not an error: it is a normal
/// routing outcome that lands on [`Channel::Failure`](crate::Channel::Failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Channel count is not a positive integer within range
    #[error("invalid channel count '{value}': {reason}")]
    InvalidChannelCount {
        /// The rejected input
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Attribute name is empty
    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    /// Routing attempted before an attribute name was configured
    #[error("router is not configured: no routing attribute name set")]
    NotConfigured,

    /// Channel name does not denote a known channel
    #[error("unknown channel '{name}'")]
    UnknownChannel {
        /// The unrecognised name
        name: String,
    },

    /// Property name is not supported by the router
    #[error("unknown property '{name}'")]
    UnknownProperty {
        /// The unrecognised property name
        name: String,
    },
}

impl RoutingError {
    /// Create an InvalidChannelCount error
    #[inline]
    pub fn invalid_channel_count(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidChannelCount {
            value: value.into(),
            reason,
        }
    }

    /// Create an UnknownChannel error
    #[inline]
    pub fn unknown_channel(name: impl Into<String>) -> Self {
        Self::UnknownChannel { name: name.into() }
    }

    /// Create an UnknownProperty error
    #[inline]
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    /// Whether this error comes from rejected configuration input
    #[inline]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidChannelCount { .. } | Self::EmptyAttributeName | Self::UnknownProperty { .. }
        )
    }
}
