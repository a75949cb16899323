//! Periodic dispatch metrics reporter
//!
//! Logs dispatch rates and per-channel counts at the `[metrics]` interval.
//!
//! # Example Output
//!
//! ```text
//! [metrics] dispatch: 12.4K/s | received: 1.2M | routed: 1.2M | failure: 310 | rejected: 0 | bp: 0
//! [metrics] channels: 1 (401.2K) | 2 (399.8K) | 3 (400.1K) | Failure (310)
//! ```

use std::fmt::Write;

use distributor_config::{MetricsConfig, MetricsFormat};
use distributor_pipeline::{DispatchMetricsHandle, MetricsSnapshot};
use serde::Serialize;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Reports dispatch metrics until cancelled
pub struct MetricsReporter {
    config: MetricsConfig,
    metrics: DispatchMetricsHandle,
    previous: Option<(MetricsSnapshot, Instant)>,
}

impl MetricsReporter {
    pub fn new(config: MetricsConfig, metrics: DispatchMetricsHandle) -> Self {
        Self {
            config,
            metrics,
            previous: None,
        }
    }

    /// Run the reporter until cancellation
    ///
    /// Spawn this as a tokio task. The first report is logged one interval
    /// after start. Returns the number of reports logged.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let Some(period) = self.config.report_interval() else {
            info!("metrics reporting disabled");
            return 0;
        };

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval = ?period,
            format = ?self.config.format,
            "metrics reporter started"
        );

        self.previous = Some((self.metrics.snapshot(), Instant::now()));
        let mut reports = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(reports, "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                    reports += 1;
                }
            }
        }

        reports
    }

    /// Collect and report metrics once
    fn report(&mut self) {
        let snapshot = self.metrics.snapshot();
        let now = Instant::now();

        let rate = self.previous.as_ref().and_then(|(prev, at)| {
            let secs = now.duration_since(*at).as_secs_f64();
            (secs > 0.0).then(|| snapshot.diff(prev).records_received as f64 / secs)
        });

        let output = match self.config.format {
            MetricsFormat::Human => format_human(&snapshot, rate),
            MetricsFormat::Json => format_json(&snapshot, rate),
        };

        // Log each line separately for human format (multiple lines)
        for line in output.lines() {
            info!("{}", line);
        }

        self.previous = Some((snapshot, now));
    }
}

#[derive(Serialize)]
struct DispatchJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    records_per_sec: Option<u64>,
    received: u64,
    routed: u64,
    failure: u64,
    rejected: u64,
    transfers_failed: u64,
    backpressure: u64,
    channels: Vec<ChannelJson<'a>>,
}

#[derive(Serialize)]
struct ChannelJson<'a> {
    channel: std::borrow::Cow<'a, str>,
    records: u64,
}

fn format_human(snapshot: &MetricsSnapshot, rate: Option<f64>) -> String {
    let mut output = String::from("[metrics] dispatch: ");
    match rate {
        Some(rate) => output.push_str(&format_rate(rate)),
        None => output.push('-'),
    }
    let _ = write!(
        output,
        " | received: {} | routed: {} | failure: {} | rejected: {} | bp: {}",
        format_count(snapshot.records_received),
        format_count(snapshot.records_routed),
        format_count(snapshot.records_failed),
        format_count(snapshot.records_rejected),
        format_count(snapshot.backpressure_events),
    );

    if !snapshot.per_channel.is_empty() {
        output.push_str("\n[metrics] channels:");
        for (i, (channel, count)) in snapshot.per_channel.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }
            let _ = write!(output, " {} ({})", channel, format_count(*count));
        }
    }

    output
}

fn format_json(snapshot: &MetricsSnapshot, rate: Option<f64>) -> String {
    let json = DispatchJson {
        report_type: "dispatch",
        records_per_sec: rate.map(|r| r as u64),
        received: snapshot.records_received,
        routed: snapshot.records_routed,
        failure: snapshot.records_failed,
        rejected: snapshot.records_rejected,
        transfers_failed: snapshot.transfers_failed,
        backpressure: snapshot.backpressure_events,
        channels: snapshot
            .per_channel
            .iter()
            .map(|(channel, records)| ChannelJson {
                channel: channel.name(),
                records: *records,
            })
            .collect(),
    };

    serde_json::to_string(&json).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
}

/// Format count with K/M suffix for readability
pub fn format_count(count: u64) -> String {
    const K: u64 = 1000;
    const M: u64 = 1_000_000;

    if count >= M {
        format!("{:.1}M", count as f64 / M as f64)
    } else if count >= K {
        format!("{:.1}K", count as f64 / K as f64)
    } else {
        count.to_string()
    }
}

/// Format rate per second with K/M suffix
pub fn format_rate(rate: f64) -> String {
    const K: f64 = 1000.0;
    const M: f64 = 1_000_000.0;

    if rate >= M {
        format!("{:.1}M/s", rate / M)
    } else if rate >= K {
        format!("{:.1}K/s", rate / K)
    } else {
        format!("{:.0}/s", rate)
    }
}
