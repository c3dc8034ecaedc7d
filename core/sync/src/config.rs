//! Synchronization settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use foldersync_common::{Error, Result, SyncPair};

use crate::journal::{EventLog, DEFAULT_LOG_PATH};
use crate::tree::TreeSynchronizer;

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_true() -> bool {
    true
}

/// Configuration for a mirroring job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory mirrored from.
    pub source: PathBuf,
    /// Directory mirrored into.
    pub destination: PathBuf,
    /// Seconds between runs.
    pub interval_secs: u64,
    /// Append-only event log.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Print events to stdout as well as the log.
    #[serde(default = "default_true")]
    pub echo: bool,
    /// Visit entries in name order.
    #[serde(default = "default_true")]
    pub sorted: bool,
}

impl SyncConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        interval_secs: u64,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            interval_secs,
            log_path: default_log_path(),
            echo: true,
            sorted: true,
        }
    }

    /// Set the log file path.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Enable or disable echoing events to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Enable or disable name-ordered traversal.
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Check the settings before anything is started.
    ///
    /// # Errors
    /// - Source folder does not exist or is not a directory
    /// - Interval is zero
    pub fn validate(&self) -> Result<()> {
        self.validate_source()?;
        self.validate_interval()
    }

    /// Check that the source folder exists and is a directory.
    pub fn validate_source(&self) -> Result<()> {
        if !self.source.exists() {
            return Err(Error::NotFound(format!(
                "Source folder '{}' does not exist.",
                self.source.display()
            )));
        }
        if !self.source.is_dir() {
            return Err(Error::NotADirectory(format!(
                "Source folder '{}' is not a directory.",
                self.source.display()
            )));
        }
        Ok(())
    }

    /// Check that the interval is a positive number of seconds.
    pub fn validate_interval(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::InvalidInput(
                "Invalid sync interval. Please provide a positive integer as the sync interval."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Create the destination folder if it is missing.
    ///
    /// Returns `true` if the folder had to be created.
    pub fn prepare_destination(&self) -> Result<bool> {
        if self.destination.is_dir() {
            return Ok(false);
        }
        if self.destination.exists() {
            return Err(Error::NotADirectory(format!(
                "Destination '{}' is not a directory.",
                self.destination.display()
            )));
        }
        std::fs::create_dir_all(&self.destination)
            .map_err(|e| Error::filesystem("create", &self.destination, e))?;
        Ok(true)
    }

    /// Period between runs.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Log file path.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn pair(&self) -> SyncPair {
        SyncPair::new(&self.source, &self.destination)
    }

    pub fn event_log(&self) -> EventLog {
        EventLog::new(&self.log_path).with_echo(self.echo)
    }

    pub fn synchronizer(&self) -> TreeSynchronizer {
        TreeSynchronizer::new().with_sorted(self.sorted)
    }
}
