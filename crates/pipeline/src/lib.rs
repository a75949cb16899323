//! Distributor - Pipeline
//!
//! The async dispatcher that connects an input queue to per-channel outputs.
//!
//! # Architecture
//!
//! ```text
//! [Input]                     [Dispatcher]                      [Channels]
//!                                                           ┌──→ 1
//!  JSON lines ──→ mpsc::Receiver ──→ Router ──→ TransferSink ┼──→ ...
//!                                  murmur3                  ├──→ N
//!                                                           └──→ Failure
//! ```
//!
//! # Key Design
//!
//! - **Exactly one destination**: every record goes to one numbered channel
//!   or to `Failure`, never both
//! - **Live reconfiguration**: the shared `Router` can change its attribute or
//!   channel count while the dispatcher runs
//! - **Backpressure**: `try_transfer` for non-blocking sends, or blocking mode
//!   that waits for queue capacity
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use distributor_pipeline::{ChannelSinks, Dispatcher};
//! use distributor_routing::{Router, RoutingConfig};
//! use tokio::sync::mpsc;
//!
//! let router = Arc::new(Router::with_config(RoutingConfig::new("tenant", 4)?));
//! let (sinks, receivers) = ChannelSinks::with_queues(router.all_channels(), 1000);
//!
//! let (tx, rx) = mpsc::channel(1000);
//! tokio::spawn(Dispatcher::new(router, sinks).run(rx));
//!
//! // Producers send records to tx
//! // Consumers drain each (channel, receiver) pair
//! ```

mod dispatcher;
mod error;
mod metrics;
mod record;
mod sink;

pub use dispatcher::{DispatchMetricsHandle, Dispatcher};
pub use error::{PipelineError, Result};
pub use metrics::{BackpressureTracker, DispatchMetrics, MetricsSnapshot};
pub use record::Record;
pub use sink::{ChannelHandle, ChannelSinks, TransferSink};

// Re-export key types from dependencies for convenience
pub use distributor_routing::{Channel, ChannelCount, Router, RoutingConfig};

/// Default queue size for dispatcher input
pub const DEFAULT_INPUT_QUEUE_SIZE: usize = 10000;
