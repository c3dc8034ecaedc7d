//! Common error types for FolderSync.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for FolderSync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Copying a file failed.
    #[error("Failed to copy '{}': {source}", path.display())]
    Transfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file for comparison failed.
    #[error("Failed to compare '{}': {source}", path.display())]
    Compare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing, deleting or creating a filesystem entry failed.
    #[error("Failed to {action} '{}': {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Scheduler is not running or dropped a reply.
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl Error {
    /// Wrap an I/O error raised while copying `path`.
    pub fn transfer(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Transfer {
            path: path.into(),
            source,
        }
    }

    /// Wrap an I/O error raised while reading `path` for comparison.
    pub fn compare(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Compare {
            path: path.into(),
            source,
        }
    }

    /// Wrap an I/O error raised while performing `action` on `path`.
    pub fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
