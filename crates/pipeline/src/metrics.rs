//! Dispatch metrics
//!
//! Atomic counters for tracking dispatcher outcomes, plus per-channel
//! transfer counts. All operations use relaxed ordering.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use distributor_routing::Channel;

/// Metrics for the dispatcher
///
/// Counters are eventually consistent, not real-time. All methods are safe to
/// call from multiple threads concurrently.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Records handed to the dispatcher
    records_received: AtomicU64,

    /// Records transferred to a numbered channel
    records_routed: AtomicU64,

    /// Records transferred to the failure channel (missing attribute)
    records_failed: AtomicU64,

    /// Records rejected because the router is unconfigured
    records_rejected: AtomicU64,

    /// Transfers that did not reach their queue
    transfers_failed: AtomicU64,

    /// Times a channel queue was full
    backpressure_events: AtomicU64,

    /// Successful transfers per channel
    per_channel: DashMap<Channel, u64>,
}

impl DispatchMetrics {
    /// Create new metrics instance with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a record entering the dispatcher
    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful transfer to `channel`
    #[inline]
    pub fn record_transferred(&self, channel: Channel) {
        if channel.is_failure() {
            self.records_failed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.records_routed.fetch_add(1, Ordering::Relaxed);
        }
        *self.per_channel.entry(channel).or_insert(0) += 1;
    }

    /// Record a record rejected by an unconfigured router
    #[inline]
    pub fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed transfer
    #[inline]
    pub fn record_transfer_failed(&self) {
        self.transfers_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backpressure event (channel queue full)
    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful transfers to `channel` so far
    pub fn transfer_count(&self, channel: Channel) -> u64 {
        self.per_channel.get(&channel).map(|c| *c).unwrap_or(0)
    }

    #[inline]
    pub fn records_received(&self) -> u64 {
        self.records_received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_failed(&self) -> u64 {
        self.records_failed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_routed: self.records_routed.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            transfers_failed: self.transfers_failed.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            per_channel: self
                .per_channel
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_received.store(0, Ordering::Relaxed);
        self.records_routed.store(0, Ordering::Relaxed);
        self.records_failed.store(0, Ordering::Relaxed);
        self.records_rejected.store(0, Ordering::Relaxed);
        self.transfers_failed.store(0, Ordering::Relaxed);
        self.backpressure_events.store(0, Ordering::Relaxed);
        self.per_channel.clear();
    }
}

/// Point-in-time snapshot of dispatch metrics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Records handed to the dispatcher
    pub records_received: u64,
    /// Records transferred to a numbered channel
    pub records_routed: u64,
    /// Records transferred to the failure channel
    pub records_failed: u64,
    /// Records rejected by an unconfigured router
    pub records_rejected: u64,
    /// Transfers that did not reach their queue
    pub transfers_failed: u64,
    /// Backpressure events
    pub backpressure_events: u64,
    /// Successful transfers per channel
    pub per_channel: BTreeMap<Channel, u64>,
}

impl MetricsSnapshot {
    /// Total successful transfers
    #[inline]
    pub fn records_transferred(&self) -> u64 {
        self.records_routed + self.records_failed
    }

    /// Fraction of received records that reached a numbered channel
    ///
    /// Returns None if no records have been received.
    #[inline]
    pub fn routing_success_rate(&self) -> Option<f64> {
        if self.records_received == 0 {
            None
        } else {
            Some(self.records_routed as f64 / self.records_received as f64)
        }
    }

    /// Difference from an earlier snapshot
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            records_received: self
                .records_received
                .saturating_sub(previous.records_received),
            records_routed: self.records_routed.saturating_sub(previous.records_routed),
            records_failed: self.records_failed.saturating_sub(previous.records_failed),
            records_rejected: self
                .records_rejected
                .saturating_sub(previous.records_rejected),
            transfers_failed: self
                .transfers_failed
                .saturating_sub(previous.transfers_failed),
            backpressure_events: self
                .backpressure_events
                .saturating_sub(previous.backpressure_events),
            per_channel: self
                .per_channel
                .iter()
                .map(|(channel, count)| {
                    let before = previous.per_channel.get(channel).copied().unwrap_or(0);
                    (*channel, count.saturating_sub(before))
                })
                .collect(),
        }
    }
}

// ============================================================================
// Backpressure Tracker - Rate-limited logging for production visibility
// ============================================================================

/// Rate-limited backpressure logging
///
/// Aggregates drop events and logs a summary at most once per second.
///
/// # Thresholds
///
/// - >0 drops/sec: WARN level
/// - >100 drops/sec: ERROR level (channel consumers can't keep up)
pub struct BackpressureTracker {
    /// Drops in current interval
    interval_drops: AtomicU64,
    /// Last log time (epoch milliseconds)
    last_log_ms: AtomicU64,
}

/// Log interval in milliseconds
const LOG_INTERVAL_MS: u64 = 1000;
/// Drops/sec that triggers ERROR level
const CRITICAL_DROP_THRESHOLD: u64 = 100;

impl BackpressureTracker {
    pub fn new() -> Self {
        Self {
            interval_drops: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    /// Record a dropped record and log if the interval has elapsed
    ///
    /// Returns true if a log was emitted.
    pub fn record_drop(&self, channel: Channel) -> bool {
        self.interval_drops.fetch_add(1, Ordering::Relaxed);
        self.maybe_log(channel)
    }

    fn maybe_log(&self, channel: Channel) -> bool {
        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);

        if now.saturating_sub(last) < LOG_INTERVAL_MS {
            return false;
        }

        // Claim the log slot so concurrent callers don't log twice
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let drops = self.interval_drops.swap(0, Ordering::Relaxed);
        if drops == 0 {
            return false;
        }

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                dropped_records = drops,
                last_channel = %channel,
                threshold = CRITICAL_DROP_THRESHOLD,
                "high backpressure: channel consumers cannot keep up"
            );
        } else {
            tracing::warn!(
                dropped_records = drops,
                last_channel = %channel,
                "backpressure: records dropped in last second"
            );
        }

        true
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn current_drops(&self) -> u64 {
        self.interval_drops.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureTracker")
            .field(
                "interval_drops",
                &self.interval_drops.load(Ordering::Relaxed),
            )
            .finish()
    }
}
