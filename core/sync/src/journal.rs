//! Run log: where synchronization events are written.
//!
//! The log file is opened fresh for every run and closed when the run ends,
//! so no file handle outlives a run. Only the active run holds a journal,
//! which keeps the file single-writer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use foldersync_common::Result;

use crate::event::{EventKind, SyncEvent};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "synclog.txt";

/// Receiver of synchronization events.
#[async_trait]
pub trait EventSink: Send {
    /// Record one event.
    async fn record(&mut self, event: SyncEvent) -> Result<()>;
}

/// Append-only log file configuration.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    echo: bool,
}

impl EventLog {
    /// Create a log that appends to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
        }
    }

    /// Also print every line to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the log for one run.
    ///
    /// # Errors
    /// - The file cannot be created or opened for appending
    pub async fn open_run(&self) -> Result<RunJournal> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        Ok(RunJournal {
            writer: BufWriter::new(file),
            echo: self.echo,
        })
    }
}

/// Log handle scoped to a single run.
pub struct RunJournal {
    writer: BufWriter<File>,
    echo: bool,
}

impl RunJournal {
    /// Flush buffered lines and release the file.
    pub async fn close(mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for RunJournal {
    async fn record(&mut self, event: SyncEvent) -> Result<()> {
        let line = event.to_line();
        debug!(target: "foldersync::event", "{}", event.kind);

        if self.echo {
            println!("{}", line);
        }

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<SyncEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in order.
    pub fn events(&self) -> &[SyncEvent] {
        &self.events
    }

    /// Recorded event kinds, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(|e| e.kind.clone()).collect()
    }

    /// Recorded events that changed the destination.
    pub fn actions(&self) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.kind.is_action())
            .map(|e| e.kind.clone())
            .collect()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn record(&mut self, event: SyncEvent) -> Result<()> {
        debug!(target: "foldersync::event", "{}", event.kind);
        self.events.push(event);
        Ok(())
    }
}
