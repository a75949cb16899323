//! Transfer sinks
//!
//! A `TransferSink` is where the dispatcher hands a routed record. The
//! bundled `ChannelSinks` keeps one bounded queue per channel; hosts drain
//! the receiving ends however they like.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use distributor_routing::Channel;
use tokio::sync::mpsc;

use crate::error::{PipelineError, Result};
use crate::record::Record;

/// Destination for routed records
///
/// `try_transfer` must not block. `transfer` may wait for capacity; the
/// default implementation just calls `try_transfer`.
#[async_trait]
pub trait TransferSink: Send + Sync {
    /// Transfer a record to `channel` without waiting
    fn try_transfer(&self, record: Record, channel: Channel) -> Result<()>;

    /// Transfer a record to `channel`, waiting for capacity if needed
    async fn transfer(&self, record: Record, channel: Channel) -> Result<()> {
        self.try_transfer(record, channel)
    }
}

#[async_trait]
impl<S: TransferSink + ?Sized> TransferSink for Arc<S> {
    fn try_transfer(&self, record: Record, channel: Channel) -> Result<()> {
        (**self).try_transfer(record, channel)
    }

    async fn transfer(&self, record: Record, channel: Channel) -> Result<()> {
        (**self).transfer(record, channel).await
    }
}

/// Queue feeding one output channel
///
/// # Example
///
/// ```ignore
/// let (tx, rx) = mpsc::channel(1000);
/// let handle = ChannelHandle::new(Channel::Numbered(1), tx);
/// sinks.register(handle);
/// ```
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    /// Channel this queue serves
    channel: Channel,

    /// Queue sender
    sender: mpsc::Sender<Record>,
}

impl ChannelHandle {
    #[inline]
    pub fn new(channel: Channel, sender: mpsc::Sender<Record>) -> Self {
        Self { channel, sender }
    }

    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Try to send a record without blocking
    #[inline]
    pub fn try_send(&self, record: Record) -> Result<()> {
        self.sender.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PipelineError::QueueFull(self.channel),
            mpsc::error::TrySendError::Closed(_) => PipelineError::ChannelClosed(self.channel),
        })
    }

    /// Send a record, waiting if the queue is full
    #[inline]
    pub async fn send(&self, record: Record) -> Result<()> {
        self.sender
            .send(record)
            .await
            .map_err(|_| PipelineError::ChannelClosed(self.channel))
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the queue
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

/// Per-channel bounded queues
///
/// Handles can be registered and removed while records are being dispatched,
/// which is how hosts follow channel set rebuilds.
#[derive(Debug, Default)]
pub struct ChannelSinks {
    handles: DashMap<Channel, ChannelHandle>,
}

impl ChannelSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue for every channel in `channels`
    ///
    /// Returns the receiving ends, in the same order.
    pub fn with_queues(
        channels: impl IntoIterator<Item = Channel>,
        queue_size: usize,
    ) -> (Self, Vec<(Channel, mpsc::Receiver<Record>)>) {
        let sinks = Self::new();
        let receivers = channels
            .into_iter()
            .map(|channel| (channel, sinks.open(channel, queue_size)))
            .collect();
        (sinks, receivers)
    }

    /// Create and register a queue for `channel`, replacing any existing one
    pub fn open(&self, channel: Channel, queue_size: usize) -> mpsc::Receiver<Record> {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        self.register(ChannelHandle::new(channel, tx));
        rx
    }

    /// Register a handle, replacing any existing one for its channel
    pub fn register(&self, handle: ChannelHandle) {
        tracing::debug!(
            channel = %handle.channel(),
            capacity = handle.max_capacity(),
            "registered channel queue"
        );
        self.handles.insert(handle.channel(), handle);
    }

    pub fn unregister(&self, channel: Channel) -> Option<ChannelHandle> {
        self.handles.remove(&channel).map(|(_, handle)| handle)
    }

    /// Drop queues for channels not in `keep`
    ///
    /// Returns the channels that were removed. `Failure` is never removed.
    pub fn retain(&self, keep: &[Channel]) -> Vec<Channel> {
        let mut removed = Vec::new();
        self.handles.retain(|channel, _| {
            let retained = channel.is_failure() || keep.contains(channel);
            if !retained {
                removed.push(*channel);
            }
            retained
        });
        removed.sort();
        removed
    }

    #[inline]
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.handles.contains_key(&channel)
    }

    /// Registered channels, sorted
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.handles.iter().map(|e| *e.key()).collect();
        channels.sort();
        channels
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn handle(&self, channel: Channel) -> Result<ChannelHandle> {
        self.handles
            .get(&channel)
            .map(|h| h.value().clone())
            .ok_or(PipelineError::ChannelNotRegistered(channel))
    }
}

#[async_trait]
impl TransferSink for ChannelSinks {
    fn try_transfer(&self, record: Record, channel: Channel) -> Result<()> {
        self.handle(channel)?.try_send(record)
    }

    async fn transfer(&self, record: Record, channel: Channel) -> Result<()> {
        // Clone the handle so no map guard is held across the await
        let handle = self.handle(channel)?;
        handle.send(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distributor_routing::Attributes;

    fn record(value: &str) -> Record {
        Record::new().with_attribute("k", value)
    }

    #[tokio::test]
    async fn test_try_transfer_delivers() {
        let sinks = ChannelSinks::new();
        let mut rx = sinks.open(Channel::Numbered(1), 4);

        sinks.try_transfer(record("a"), Channel::Numbered(1)).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.attributes().get("k").map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_unregistered_channel() {
        let sinks = ChannelSinks::new();
        let err = sinks
            .try_transfer(record("a"), Channel::Numbered(3))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ChannelNotRegistered(Channel::Numbered(3))));
    }

    #[tokio::test]
    async fn test_full_queue_is_backpressure() {
        let sinks = ChannelSinks::new();
        let _rx = sinks.open(Channel::Failure, 1);

        sinks.try_transfer(record("a"), Channel::Failure).unwrap();
        let err = sinks.try_transfer(record("b"), Channel::Failure).unwrap_err();
        assert!(err.is_backpressure());
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let sinks = ChannelSinks::new();
        let rx = sinks.open(Channel::Numbered(1), 1);
        drop(rx);

        let err = sinks
            .try_transfer(record("a"), Channel::Numbered(1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ChannelClosed(Channel::Numbered(1))));

        let err = sinks
            .transfer(record("a"), Channel::Numbered(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ChannelClosed(_)));
    }

    #[tokio::test]
    async fn test_blocking_transfer_waits_for_capacity() {
        let sinks = Arc::new(ChannelSinks::new());
        let mut rx = sinks.open(Channel::Numbered(1), 1);

        sinks.try_transfer(record("a"), Channel::Numbered(1)).unwrap();

        let sender = {
            let sinks = Arc::clone(&sinks);
            tokio::spawn(async move { sinks.transfer(record("b"), Channel::Numbered(1)).await })
        };

        assert_eq!(rx.recv().await.unwrap().attribute("k"), Some("a"));
        assert_eq!(rx.recv().await.unwrap().attribute("k"), Some("b"));
        sender.await.unwrap().unwrap();
    }

    #[test]
    fn test_with_queues() {
        let channels = [Channel::Numbered(1), Channel::Numbered(2), Channel::Failure];
        let (sinks, receivers) = ChannelSinks::with_queues(channels, 8);

        assert_eq!(sinks.len(), 3);
        assert_eq!(receivers.len(), 3);
        assert_eq!(receivers[2].0, Channel::Failure);
        assert_eq!(sinks.channels(), channels.to_vec());
    }

    #[test]
    fn test_retain_keeps_failure() {
        let channels = (1..=4).map(Channel::Numbered).chain([Channel::Failure]);
        let (sinks, _receivers) = ChannelSinks::with_queues(channels, 8);

        let removed = sinks.retain(&[Channel::Numbered(1), Channel::Numbered(2)]);

        assert_eq!(removed, vec![Channel::Numbered(3), Channel::Numbered(4)]);
        assert!(sinks.has_channel(Channel::Failure));
        assert!(!sinks.has_channel(Channel::Numbered(3)));
    }

    #[test]
    fn test_unregister() {
        let sinks = ChannelSinks::new();
        let _rx = sinks.open(Channel::Numbered(1), 1);

        assert!(sinks.unregister(Channel::Numbered(1)).is_some());
        assert!(sinks.unregister(Channel::Numbered(1)).is_none());
        assert!(sinks.is_empty());
    }

    #[test]
    fn test_handle_capacity() {
        let (tx, _rx) = mpsc::channel(5);
        let handle = ChannelHandle::new(Channel::Numbered(2), tx);
        assert_eq!(handle.capacity(), 5);
        assert_eq!(handle.max_capacity(), 5);
        assert!(!handle.is_closed());
    }
}
