//! Run command - route JSON-lines records to per-channel outputs
//!
//! Reads one record per line from `--input` (or stdin), dispatches each to
//! exactly one channel and writes it to that channel's output. Invalid lines
//! are skipped with a warning. Prints a per-channel summary at the end.
//!
//! On Ctrl-C, records already read are drained and summarized, then the
//! process exits with status 130. It exits directly because a pending read
//! on stdin cannot be cancelled and would hold runtime shutdown until the
//! next line arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use distributor_config::Config;
use distributor_pipeline::{
    Channel, ChannelSinks, DEFAULT_INPUT_QUEUE_SIZE, Dispatcher, MetricsSnapshot, Record, Router,
};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::RoutingArgs;
use crate::output::Output;
use crate::reporter::MetricsReporter;

/// Exit status after Ctrl-C (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Run command arguments
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Read records from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write `<channel>.jsonl` files into this directory instead of stdout
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub routing: RoutingArgs,
}

/// Line counts from the input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Lines read
    pub lines: u64,
    /// Records forwarded to the dispatcher
    pub records: u64,
    /// Lines that were not valid records
    pub invalid: u64,
}

/// Run the run command
pub async fn run(args: RunArgs, config: Config) -> Result<()> {
    let routing = args.routing.routing_config(&config)?;
    if args.output_dir.is_none() && config.log.writes_to_stdout() {
        bail!(
            "[log] output = \"stdout\" would mix log lines into routed records; \
             use --output-dir or log to stderr"
        );
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        attribute = %routing.attribute_name,
        channel_count = %routing.channel_count,
        queue_size = config.pipeline.queue_size,
        blocking = config.pipeline.blocking,
        "distributor starting"
    );

    let router = Arc::new(Router::with_config(routing));
    let channels = router.all_channels();
    let (sinks, receivers) = ChannelSinks::with_queues(channels.clone(), config.pipeline.queue_size);
    let dispatcher = Dispatcher::new(router, sinks).with_blocking(config.pipeline.blocking);

    let output = Output::prepare(args.output_dir.as_deref()).await?;
    let writers = output.spawn_writers(receivers);

    let cancel = CancellationToken::new();
    let reporter = MetricsReporter::new(config.metrics.clone(), dispatcher.metrics_handle());
    let reporter_task = tokio::spawn(reporter.run(cancel.clone()));

    let (tx, rx) = mpsc::channel(DEFAULT_INPUT_QUEUE_SIZE);
    let dispatch_task = tokio::spawn(dispatcher.run(rx));

    let input = tokio::select! {
        result = read_input(args.input.as_deref(), tx) => Some(result?),
        _ = signal::ctrl_c() => {
            warn!("interrupted, stopping input");
            None
        }
    };

    // Input sender is gone; the dispatcher drains its queue and exits,
    // closing every channel queue behind it.
    let snapshot = dispatch_task.await.context("dispatcher task failed")?;

    for writer in writers {
        writer.await.context("output writer task failed")??;
    }

    cancel.cancel();
    let _ = reporter_task.await;

    let summary = summary_lines(&snapshot, &channels, input.as_ref());
    if output.is_stdout() {
        for line in summary {
            eprintln!("{}", line);
        }
    } else {
        for line in summary {
            println!("{}", line);
        }
    }

    if input.is_none() {
        info!("distributor interrupted");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }

    info!("distributor finished");
    Ok(())
}

async fn read_input(path: Option<&Path>, tx: mpsc::Sender<Record>) -> Result<InputStats> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("failed to open input {}", path.display()))?;
            forward_records(BufReader::new(file), tx).await
        }
        None => forward_records(BufReader::new(tokio::io::stdin()), tx).await,
    }
}

/// Parse JSON lines from `reader` and send them to the dispatcher
///
/// Blank lines are ignored. Stops early if the dispatcher is gone.
pub async fn forward_records<R>(reader: R, tx: mpsc::Sender<Record>) -> Result<InputStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = InputStats::default();

    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        stats.lines += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Record::from_json(line) {
            Ok(record) => {
                if tx.send(record).await.is_err() {
                    warn!(line = stats.lines, "dispatcher stopped, discarding remaining input");
                    break;
                }
                stats.records += 1;
            }
            Err(e) => {
                stats.invalid += 1;
                warn!(line = stats.lines, error = %e, "skipping invalid record");
            }
        }
    }

    Ok(stats)
}

/// Human-readable run summary
pub fn summary_lines(
    snapshot: &MetricsSnapshot,
    channels: &[Channel],
    input: Option<&InputStats>,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(channels.len() + 2);

    let mut header = format!(
        "records: {} received, {} routed, {} failure, {} rejected, {} dropped",
        snapshot.records_received,
        snapshot.records_routed,
        snapshot.records_failed,
        snapshot.records_rejected,
        snapshot.transfers_failed,
    );
    match input {
        Some(stats) if stats.invalid > 0 => {
            header.push_str(&format!(", {} invalid lines skipped", stats.invalid));
        }
        Some(_) => {}
        None => header.push_str(" (interrupted)"),
    }
    lines.push(header);

    let width = channels
        .iter()
        .map(|c| c.name().len())
        .max()
        .unwrap_or(0);
    for channel in channels {
        let count = snapshot.per_channel.get(channel).copied().unwrap_or(0);
        lines.push(format!("  {:<width$}  {}", channel.name(), count, width = width));
    }

    lines
}
