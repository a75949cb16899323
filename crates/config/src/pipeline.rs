//! Pipeline configuration
//!
//! Queue sizing and backpressure behavior for per-channel output queues.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default capacity of each channel's output queue
pub const DEFAULT_QUEUE_SIZE: usize = 1000;

/// Pipeline section
///
/// # Example
///
/// ```toml
/// [pipeline]
/// queue_size = 4096
/// blocking = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each channel's output queue (records)
    /// Default: 1000
    pub queue_size: usize,

    /// Wait for queue capacity instead of dropping on backpressure
    /// Default: true
    pub blocking: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            blocking: true,
        }
    }
}

impl PipelineConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.queue_size == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline",
                "queue_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}
