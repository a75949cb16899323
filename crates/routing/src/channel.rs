//! Channel identifier type
//!
//! `Channel` names one output destination. Numbered channels are created by
//! the channel set; the failure channel always exists.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RoutingError};

/// Output destination for a routed record
///
/// The display name is derived from the variant alone: a numbered channel is
/// named by the decimal string of its number, the failure channel is named
/// `Failure`.
///
/// # Example
///
/// ```
/// use distributor_routing::Channel;
///
/// assert_eq!(Channel::Numbered(3).name(), "3");
/// assert_eq!(Channel::Failure.name(), "Failure");
/// assert_eq!("2".parse::<Channel>().unwrap(), Channel::Numbered(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Numbered output channel, `1..=N`
    Numbered(u32),
    /// Destination for records without the routing attribute
    Failure,
}

impl Channel {
    /// Display name of the failure channel
    pub const FAILURE_NAME: &'static str = "Failure";

    /// Display name of this channel
    #[inline]
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Numbered(n) => Cow::Owned(n.to_string()),
            Self::Failure => Cow::Borrowed(Self::FAILURE_NAME),
        }
    }

    /// Channel number, `None` for the failure channel
    #[inline]
    #[must_use]
    pub const fn number(&self) -> Option<u32> {
        match self {
            Self::Numbered(n) => Some(*n),
            Self::Failure => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{n}"),
            Self::Failure => f.write_str(Self::FAILURE_NAME),
        }
    }
}

impl FromStr for Channel {
    type Err = RoutingError;

    /// Parse a channel display name
    ///
    /// Accepts `Failure` or the canonical decimal form of a number >= 1.
    /// Non-canonical spellings such as `01` or `+1` are rejected so that
    /// every channel has exactly one name.
    fn from_str(s: &str) -> Result<Self> {
        if s == Self::FAILURE_NAME {
            return Ok(Self::Failure);
        }

        match s.parse::<u32>() {
            Ok(n) if n >= 1 && n.to_string() == s => Ok(Self::Numbered(n)),
            _ => Err(RoutingError::unknown_channel(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_name() {
        assert_eq!(Channel::Numbered(1).name(), "1");
        assert_eq!(Channel::Numbered(42).name(), "42");
    }

    #[test]
    fn test_failure_name() {
        assert_eq!(Channel::Failure.name(), "Failure");
        assert_eq!(Channel::Failure.to_string(), "Failure");
    }

    #[test]
    fn test_display_matches_name() {
        for channel in [Channel::Numbered(1), Channel::Numbered(900), Channel::Failure] {
            assert_eq!(channel.to_string(), channel.name());
        }
    }

    #[test]
    fn test_number() {
        assert_eq!(Channel::Numbered(5).number(), Some(5));
        assert_eq!(Channel::Failure.number(), None);
        assert!(Channel::Failure.is_failure());
        assert!(!Channel::Numbered(5).is_failure());
    }

    #[test]
    fn test_parse() {
        assert_eq!("1".parse::<Channel>().unwrap(), Channel::Numbered(1));
        assert_eq!("17".parse::<Channel>().unwrap(), Channel::Numbered(17));
        assert_eq!("Failure".parse::<Channel>().unwrap(), Channel::Failure);
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        for bad in ["0", "01", "+1", "-1", "", "failure", "one", " 1"] {
            let err = bad.parse::<Channel>().unwrap_err();
            assert_eq!(err, RoutingError::unknown_channel(bad), "input {bad:?}");
        }
    }

    #[test]
    fn test_hash_set() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Channel::Numbered(1));
        set.insert(Channel::Failure);
        set.insert(Channel::Numbered(1));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_copy() {
        let a = Channel::Numbered(3);
        let b = a;
        assert_eq!(a, b);
    }
}
