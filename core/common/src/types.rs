//! Common types used throughout FolderSync.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single directory entry name.
///
/// Names are kept as `OsString` so entries that are not valid UTF-8 still
/// round-trip to the filesystem unchanged; `Display` is lossy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(OsString);

impl EntryName {
    /// Create a new entry name.
    ///
    /// # Preconditions
    /// - `name` must be non-empty
    /// - `name` must not contain a path separator of the current platform
    /// - `name` must not be `.` or `..`
    ///
    /// # Errors
    /// - Returns `InvalidInput` if any precondition fails
    pub fn new(name: impl Into<OsString>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Entry name cannot be empty".to_string(),
            ));
        }
        if name == "." || name == ".." {
            return Err(crate::Error::InvalidInput(format!(
                "Entry name cannot be '{}'",
                name.to_string_lossy()
            )));
        }
        let lossy = name.to_string_lossy();
        if lossy.chars().any(std::path::is_separator) {
            return Err(crate::Error::InvalidInput(
                "Entry name cannot contain separators".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Take the final component of `path` as an entry name.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        match path.file_name() {
            Some(name) => Self::new(name),
            None => Err(crate::Error::InvalidInput(format!(
                "Path has no file name: {}",
                path.display()
            ))),
        }
    }

    /// Get the raw OS name.
    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }
}

impl AsRef<Path> for EntryName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

/// A source directory paired with the destination it is mirrored into.
///
/// The top-level run builds one pair from configuration; every recursive
/// descent builds a child pair for the matching subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPair {
    source: PathBuf,
    destination: PathBuf,
}

impl SyncPair {
    /// Create a new pair.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Source directory.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Pair for the subdirectory `name` on both sides.
    pub fn child(&self, name: &EntryName) -> Self {
        Self {
            source: self.source.join(name),
            destination: self.destination.join(name),
        }
    }
}

impl fmt::Display for SyncPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source.display(),
            self.destination.display()
        )
    }
}
