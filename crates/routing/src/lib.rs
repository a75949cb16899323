//! Distributor - Routing
//!
//! Deterministic attribute-keyed fan-out: every record is sent to exactly one
//! output channel, and records sharing a routing key value always share a
//! channel.
//!
//! # Design
//!
//! - `Channel` is `Copy`: either `Numbered(n)` or the `Failure` singleton
//! - `ChannelSet` is an immutable snapshot of the numbered channels `1..=N`
//! - `ChannelSetManager` publishes a new snapshot on every rebuild via an
//!   atomic pointer swap; readers never lock
//! - `Router` owns the routing attribute and the manager; routing is a pure,
//!   synchronous computation over the current snapshots
//!
//! # Routing function
//!
//! ```text
//! value ──UTF-8──→ murmur3_x86_32(seed 0) ──as i32──→ floor_mod(h, N) + 1 ──→ Channel
//! ```
//!
//! A record without the routing attribute goes to `Channel::Failure` and a
//! warning naming the attribute is logged.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use distributor_routing::{Channel, ChannelCount, Router, RoutingConfig};
//!
//! let router = Router::with_config(RoutingConfig::new("tenant", 2).unwrap());
//!
//! let mut record = HashMap::new();
//! record.insert("tenant".to_string(), "Some attribute value".to_string());
//! assert_eq!(router.route(&record).unwrap(), Channel::Numbered(1));
//!
//! // Growing the channel set takes effect for the next record
//! router.set_channel_count(ChannelCount::new(4).unwrap());
//! assert_eq!(router.all_channels().len(), 5);
//! ```

mod channel;
mod channel_set;
mod config;
mod error;
pub mod hash;
mod manager;
mod property;
mod router;


pub use channel::Channel;
pub use channel_set::{ChannelCount, ChannelSet};
pub use config::{AttributeName, RoutingConfig};
pub use error::{Result, RoutingError};
pub use hash::stable_hash32;
pub use manager::ChannelSetManager;
pub use property::Property;
pub use router::{Attributes, Router, route_record};
