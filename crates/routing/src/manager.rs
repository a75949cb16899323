//! Channel set manager
//!
//! Owns the current [`ChannelSet`] and replaces it wholesale when the channel
//! count changes.
//!
//! # Architecture
//!
//! ```text
//! [route()] → [ArcSwap::load()] → &ChannelSet → Channel
//!                   ↓ (rebuild)
//!             [ArcSwap::store(new_set)]
//!                   ↓
//!             [old set dropped when the last reader releases it]
//! ```
//!
//! Readers never take a lock. Writers serialize on a mutex so generations are
//! published in order, and each new set is fully built before it is stored.

use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::Channel;
use crate::channel_set::{ChannelCount, ChannelSet};
use crate::error::Result;

/// Publishes immutable channel set snapshots
pub struct ChannelSetManager {
    /// Current snapshot
    current: ArcSwap<ChannelSet>,

    /// Generation of the last published snapshot, guarded for writers
    write_lock: Mutex<u64>,
}

impl ChannelSetManager {
    /// Create a manager holding the set `1..=count`
    pub fn initialize(count: ChannelCount) -> Self {
        tracing::debug!(channel_count = count.get(), "channel set initialized");

        Self {
            current: ArcSwap::from_pointee(ChannelSet::new(count, 0)),
            write_lock: Mutex::new(0),
        }
    }

    /// Replace the current set with a fresh `1..=count` set
    ///
    /// Always builds a new snapshot, even if the count is unchanged.
    /// Returns the newly published set.
    pub fn rebuild(&self, count: ChannelCount) -> Arc<ChannelSet> {
        let mut generation = self.write_lock.lock();
        *generation += 1;

        let previous = self.current.load().len();
        let set = Arc::new(ChannelSet::new(count, *generation));
        self.current.store(Arc::clone(&set));

        tracing::info!(
            previous_count = previous,
            channel_count = count.get(),
            generation = *generation,
            "channel set rebuilt"
        );

        set
    }

    /// Parse `value` as a channel count and rebuild
    ///
    /// An invalid value leaves the current set untouched.
    pub fn rebuild_from_str(&self, value: &str) -> Result<Arc<ChannelSet>> {
        let count = ChannelCount::from_str(value)?;
        Ok(self.rebuild(count))
    }

    /// Current snapshot
    ///
    /// The returned set stays valid for as long as the caller holds it, even
    /// if a rebuild publishes a newer one meanwhile.
    #[inline]
    pub fn snapshot(&self) -> Arc<ChannelSet> {
        self.current.load_full()
    }

    /// Borrow the current snapshot for a short read
    #[inline]
    pub fn load(&self) -> arc_swap::Guard<Arc<ChannelSet>> {
        self.current.load()
    }

    /// Current channel count
    #[inline]
    pub fn channel_count(&self) -> ChannelCount {
        self.current.load().count()
    }

    /// Generation of the current snapshot
    #[inline]
    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Current numbered channels plus `Failure`
    pub fn all_channels(&self) -> Vec<Channel> {
        self.current.load().all_channels()
    }
}

impl Default for ChannelSetManager {
    fn default() -> Self {
        Self::initialize(ChannelCount::DEFAULT)
    }
}

impl std::fmt::Debug for ChannelSetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.load();
        f.debug_struct("ChannelSetManager")
            .field("channel_count", &current.len())
            .field("generation", &current.generation())
            .finish()
    }
}
