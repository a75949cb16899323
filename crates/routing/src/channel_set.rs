//! Channel sets: immutable snapshots of the numbered output channels
//!
//! A `ChannelSet` is built once for a given `ChannelCount` and never mutated.
//! Configuration changes build a new set and publish it through the
//! [`ChannelSetManager`](crate::ChannelSetManager).

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::Channel;
use crate::error::{Result, RoutingError};
use crate::hash::{destination_number, stable_hash32};

/// Number of numbered output channels
///
/// Always at least one and at most [`ChannelCount::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelCount(NonZeroU32);

const TOO_LARGE: &str = "exceeds the maximum of 2147483647 channels";

impl ChannelCount {
    /// Largest supported channel count, the largest positive 32-bit signed integer
    pub const MAX: u32 = i32::MAX as u32;

    /// Count used before any configuration has been applied
    pub const DEFAULT: ChannelCount = ChannelCount(NonZeroU32::MIN);

    /// Create a channel count, validating the range
    pub fn new(count: u32) -> Result<Self> {
        if count > Self::MAX {
            return Err(RoutingError::invalid_channel_count(count.to_string(), TOO_LARGE));
        }

        NonZeroU32::new(count).map(Self).ok_or_else(|| {
            RoutingError::invalid_channel_count(count.to_string(), "must be at least 1")
        })
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for ChannelCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ChannelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelCount {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .parse()
            .map_err(|_| RoutingError::invalid_channel_count(s, "not an integer"))?;

        if value < 1 {
            return Err(RoutingError::invalid_channel_count(s, "must be at least 1"));
        }

        u32::try_from(value)
            .ok()
            .and_then(|value| Self::new(value).ok())
            .ok_or_else(|| RoutingError::invalid_channel_count(s, TOO_LARGE))
    }
}

impl TryFrom<u32> for ChannelCount {
    type Error = RoutingError;

    fn try_from(count: u32) -> Result<Self> {
        Self::new(count)
    }
}

impl From<ChannelCount> for u32 {
    fn from(count: ChannelCount) -> Self {
        count.get()
    }
}

/// Immutable set of numbered channels `1..=N`
///
/// Each rebuild produces a set with a fresh `generation`, even when the count
/// is unchanged, so callers can tell two sets of the same size apart.
///
/// # Example
///
/// ```
/// use distributor_routing::{Channel, ChannelCount, ChannelSet};
///
/// let set = ChannelSet::new(ChannelCount::new(3).unwrap(), 0);
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.get(2), Some(Channel::Numbered(2)));
/// assert_eq!(set.get(4), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    /// Channels are `1..=count`; nothing is stored per channel
    count: ChannelCount,

    /// Rebuild counter of the manager that produced this set
    generation: u64,
}

impl ChannelSet {
    /// Build the contiguous set `1..=count`
    #[must_use]
    pub fn new(count: ChannelCount, generation: u64) -> Self {
        Self { count, generation }
    }

    /// Number of numbered channels (excludes `Failure`)
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.count.get()
    }

    /// Always false: a set holds at least one channel
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Channel count this set was built for
    #[inline]
    #[must_use]
    pub fn count(&self) -> ChannelCount {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a numbered channel
    #[inline]
    #[must_use]
    pub fn get(&self, number: u32) -> Option<Channel> {
        (1..=self.len())
            .contains(&number)
            .then_some(Channel::Numbered(number))
    }

    /// Look up a channel by display name, including `Failure`
    pub fn get_by_name(&self, name: &str) -> Option<Channel> {
        match name.parse::<Channel>().ok()? {
            Channel::Failure => Some(Channel::Failure),
            Channel::Numbered(n) => self.get(n),
        }
    }

    /// Whether `channel` is a destination of this set (`Failure` always is)
    #[inline]
    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Failure => true,
            Channel::Numbered(n) => self.get(n).is_some(),
        }
    }

    /// Channel for a routing hash
    #[inline]
    #[must_use]
    pub fn channel_for_hash(&self, hash: i32) -> Channel {
        Channel::Numbered(destination_number(hash, self.len()))
    }

    /// Channel for an attribute value
    #[inline]
    #[must_use]
    pub fn channel_for_value(&self, value: &str) -> Channel {
        self.channel_for_hash(stable_hash32(value))
    }

    /// Iterate over the numbered channels in order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        (1..=self.len()).map(Channel::Numbered)
    }

    /// Numbered channels followed by `Failure`
    ///
    /// This is the full list of destinations a host must wire downstream.
    pub fn all_channels(&self) -> Vec<Channel> {
        self.iter().chain(std::iter::once(Channel::Failure)).collect()
    }

    /// Display names of all destinations, numbered first
    pub fn channel_names(&self) -> Vec<String> {
        self.all_channels()
            .iter()
            .map(|c| c.name().into_owned())
            .collect()
    }
}
