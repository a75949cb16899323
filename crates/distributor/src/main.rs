//! Distributor - Attribute-keyed record fan-out
//!
//! # Usage
//!
//! ```bash
//! # Route JSON-lines records (default command)
//! distributor --config distributor.toml < records.jsonl
//! distributor run --input records.jsonl --output-dir out/ --attribute tenant --channels 4
//!
//! # Show the declared output channels
//! distributor channels --channels 4
//!
//! # Show where values would go
//! distributor hash acme globex --channels 4
//! ```

mod cmd;
mod output;
mod reporter;

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use distributor_config::{LogConfig, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Distributor - deterministic attribute-keyed record fan-out
#[derive(Parser, Debug)]
#[command(name = "distributor")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides [log] level
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route JSON-lines records to per-channel outputs
    Run(cmd::run::RunArgs),

    /// Print the output channels for the configured channel count
    Channels(cmd::channels::ChannelsArgs),

    /// Print the hash and destination channel of attribute values
    Hash(cmd::hash::HashArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cmd::load_config(cli.config.as_deref())?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    // No subcommand = run (default behavior)
    match cli.command.unwrap_or_else(|| Command::Run(Default::default())) {
        Command::Run(args) => cmd::run::run(args, config).await,
        Command::Channels(args) => cmd::channels::run(args, &config),
        Command::Hash(args) => cmd::hash::run(args, &config),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(config: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_new(config.directive(cli_level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match &config.output {
        LogOutput::Stdout => (
            BoxMakeWriter::new(std::io::stdout),
            std::io::stdout().is_terminal(),
        ),
        LogOutput::Stderr => (
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(false);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.is_json() {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
