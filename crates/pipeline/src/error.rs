//! Pipeline error types
//!
//! Error types for record dispatch and channel transfers.

use distributor_routing::{Channel, RoutingError};
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Router rejected the record (e.g. not configured)
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    /// No output queue registered for the channel
    #[error("no queue registered for channel {0}")]
    ChannelNotRegistered(Channel),

    /// Output queue for the channel is closed
    #[error("queue closed for channel {0}")]
    ChannelClosed(Channel),

    /// Output queue for the channel is full
    #[error("queue full for channel {0} (backpressure)")]
    QueueFull(Channel),

    /// Malformed input record
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the failure is backpressure rather than a wiring problem
    #[inline]
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::QueueFull(_))
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
