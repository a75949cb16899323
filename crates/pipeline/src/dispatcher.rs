//! Dispatcher - routes records and hands them to the transfer sink
//!
//! The `Dispatcher` owns the per-record loop: ask the [`Router`] for a
//! destination, transfer the record there, and account for the outcome.

use std::sync::Arc;

use distributor_routing::{Channel, Router, RoutingError};
use tokio::sync::mpsc;

use crate::error::{PipelineError, Result};
use crate::metrics::{BackpressureTracker, DispatchMetrics, MetricsSnapshot};
use crate::record::Record;
use crate::sink::TransferSink;

/// Async dispatcher that connects an input queue to per-channel outputs
///
/// # Design
///
/// - Every record is routed to exactly one channel by the shared [`Router`]
/// - Records without the routing attribute go to [`Channel::Failure`]
/// - Records arriving while the router is unconfigured are rejected
/// - Blocking mode (the default) waits for queue capacity
/// - Non-blocking mode uses `try_transfer` and counts full queues as backpressure
///
/// # Example
///
/// ```ignore
/// let router = Arc::new(Router::with_config(RoutingConfig::new("tenant", 2)?));
/// let (sinks, receivers) = ChannelSinks::with_queues(router.all_channels(), 1000);
/// let dispatcher = Dispatcher::new(router, sinks);
///
/// let (tx, rx) = mpsc::channel(1000);
/// tokio::spawn(dispatcher.run(rx));
/// ```
pub struct Dispatcher<S> {
    /// Shared router; configuration changes are picked up per record
    router: Arc<Router>,

    /// Where routed records go
    sink: S,

    /// Dispatch metrics (Arc for sharing with metrics handle)
    metrics: Arc<DispatchMetrics>,

    /// Rate-limited backpressure logging
    backpressure_tracker: BackpressureTracker,

    /// Wait for queue capacity instead of dropping
    blocking: bool,
}

/// Handle for reading dispatch metrics externally
///
/// Remains valid after the dispatcher is consumed by `run()`.
#[derive(Debug, Clone)]
pub struct DispatchMetricsHandle {
    metrics: Arc<DispatchMetrics>,
}

impl DispatchMetricsHandle {
    /// Current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Successful transfers to `channel` so far
    pub fn transfer_count(&self, channel: Channel) -> u64 {
        self.metrics.transfer_count(channel)
    }
}

impl<S: TransferSink> Dispatcher<S> {
    /// Create a blocking dispatcher
    ///
    /// Matches the `[pipeline] blocking = true` default: `process` waits for
    /// queue capacity. Use [`with_blocking(false)`](Self::with_blocking) to
    /// drop on backpressure instead.
    pub fn new(router: Arc<Router>, sink: S) -> Self {
        Self {
            router,
            sink,
            metrics: Arc::new(DispatchMetrics::new()),
            backpressure_tracker: BackpressureTracker::new(),
            blocking: true,
        }
    }

    /// Switch between blocking and non-blocking transfers
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> DispatchMetricsHandle {
        DispatchMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    #[inline]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    #[inline]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Route a record and transfer it without waiting
    ///
    /// This is the hot path. Returns the channel the record was transferred to.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Routing`] if the router has no attribute configured
    /// - [`PipelineError::QueueFull`] on backpressure (the record is dropped)
    /// - [`PipelineError::ChannelNotRegistered`] / [`PipelineError::ChannelClosed`]
    ///   if the destination has no live queue
    pub fn dispatch(&self, record: Record) -> Result<Channel> {
        let channel = self.route(&record)?;
        let result = self.sink.try_transfer(record, channel);
        self.account(channel, result)
    }

    /// Route a record and transfer it, waiting for queue capacity
    pub async fn dispatch_blocking(&self, record: Record) -> Result<Channel> {
        let channel = self.route(&record)?;
        let result = self.sink.transfer(record, channel).await;
        self.account(channel, result)
    }

    /// Dispatch using the configured mode
    pub async fn process(&self, record: Record) -> Result<Channel> {
        if self.blocking {
            self.dispatch_blocking(record).await
        } else {
            self.dispatch(record)
        }
    }

    fn route(&self, record: &Record) -> Result<Channel> {
        self.metrics.record_received();

        match self.router.route(record) {
            Ok(channel) => Ok(channel),
            Err(e) => {
                self.metrics.record_rejected();
                if matches!(e, RoutingError::NotConfigured) {
                    tracing::debug!("record rejected: routing attribute not configured");
                }
                Err(e.into())
            }
        }
    }

    fn account(&self, channel: Channel, result: Result<()>) -> Result<Channel> {
        match result {
            Ok(()) => {
                self.metrics.record_transferred(channel);
                Ok(channel)
            }
            Err(e @ PipelineError::QueueFull(_)) => {
                self.metrics.record_backpressure();
                self.metrics.record_transfer_failed();

                // Rate-limited logging (aggregates to 1 log/sec)
                self.backpressure_tracker.record_drop(channel);

                tracing::debug!(channel = %channel, "channel queue full (backpressure)");
                Err(e)
            }
            Err(e) => {
                self.metrics.record_transfer_failed();
                tracing::warn!(channel = %channel, error = %e, "transfer failed");
                Err(e)
            }
        }
    }

    /// Run the dispatcher until the input queue is closed
    ///
    /// Per-record errors are counted and logged, never fatal. Returns the
    /// final metrics snapshot.
    pub async fn run(self, mut receiver: mpsc::Receiver<Record>) -> MetricsSnapshot {
        let channels = self.router.channels().snapshot();
        tracing::info!(
            attribute = ?self.router.attribute_name().as_deref().map(|a| a.as_str()),
            channel_count = channels.len(),
            generation = channels.generation(),
            blocking = self.blocking,
            "dispatcher starting"
        );

        while let Some(record) = receiver.recv().await {
            let _ = self.process(record).await;
        }

        // Log final metrics
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            records_received = snapshot.records_received,
            records_routed = snapshot.records_routed,
            records_failed = snapshot.records_failed,
            records_rejected = snapshot.records_rejected,
            transfers_failed = snapshot.transfers_failed,
            backpressure_events = snapshot.backpressure_events,
            "dispatcher shutting down"
        );

        snapshot
    }
}

impl<S> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("blocking", &self.blocking)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
