//! Channel output writers
//!
//! Drains each channel queue into its destination:
//!
//! - directory mode: one `<channel>.jsonl` file per channel, every declared
//!   channel gets a file even if nothing is routed to it
//! - stdout mode: one `{"channel": "...", "record": {...}}` line per record

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use distributor_pipeline::{Channel, Record};
use serde::Serialize;
use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Records written to stdout, tagged with their channel
#[derive(Serialize)]
struct Envelope<'a> {
    channel: Cow<'static, str>,
    record: &'a Record,
}

/// Where transferred records are written
#[derive(Debug, Clone)]
pub enum Output {
    /// One JSON-lines file per channel
    Directory(PathBuf),
    /// Tagged JSON lines on stdout
    Stdout,
}

impl Output {
    /// Pick the output, creating the directory if needed
    pub async fn prepare(output_dir: Option<&Path>) -> Result<Self> {
        match output_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("failed to create output directory {}", dir.display()))?;
                Ok(Self::Directory(dir.to_path_buf()))
            }
            None => Ok(Self::Stdout),
        }
    }

    /// Whether records go to stdout
    pub fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    /// File a channel is written to in directory mode
    pub fn channel_path(dir: &Path, channel: Channel) -> PathBuf {
        dir.join(format!("{}.jsonl", channel.name()))
    }

    /// Spawn one writer task per channel queue
    ///
    /// Each task finishes once its queue is closed and returns the number of
    /// records it wrote.
    pub fn spawn_writers(
        &self,
        receivers: Vec<(Channel, mpsc::Receiver<Record>)>,
    ) -> Vec<JoinHandle<Result<u64>>> {
        match self {
            Self::Directory(dir) => receivers
                .into_iter()
                .map(|(channel, rx)| {
                    let path = Self::channel_path(dir, channel);
                    tokio::spawn(write_file(path, channel, rx))
                })
                .collect(),
            Self::Stdout => {
                let stdout = Arc::new(Mutex::new(BufWriter::new(tokio::io::stdout())));
                receivers
                    .into_iter()
                    .map(|(channel, rx)| tokio::spawn(write_tagged(Arc::clone(&stdout), channel, rx)))
                    .collect()
            }
        }
    }
}

async fn write_file(path: PathBuf, channel: Channel, mut rx: mpsc::Receiver<Record>) -> Result<u64> {
    let file = File::create(&path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut written = 0;

    while let Some(record) = rx.recv().await {
        write_line(&mut writer, &record.to_json()?).await?;
        written += 1;
    }

    writer.flush().await?;
    tracing::debug!(channel = %channel, path = %path.display(), written, "channel output closed");
    Ok(written)
}

async fn write_tagged<W>(
    writer: Arc<Mutex<W>>,
    channel: Channel,
    mut rx: mpsc::Receiver<Record>,
) -> Result<u64>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut written = 0;

    while let Some(record) = rx.recv().await {
        let line = tagged_line(channel, &record)?;
        write_line(&mut *writer.lock().await, &line).await?;
        written += 1;
    }

    writer.lock().await.flush().await?;
    Ok(written)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

/// Stdout form of a record
pub fn tagged_line(channel: Channel, record: &Record) -> Result<String> {
    let envelope = Envelope {
        channel: channel.name(),
        record,
    };
    Ok(serde_json::to_string(&envelope)?)
}
