//! Events emitted during a synchronization run.

use chrono::{DateTime, Local};
use std::fmt;

use foldersync_common::EntryName;

/// Timestamp layout used for every log line.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Top-level run began.
    RunStarted,
    /// File missing from the destination is being copied.
    Copying(EntryName),
    /// File differing from the destination is being overwritten.
    Updating(EntryName),
    /// File absent from the source is being removed from the destination.
    Deleting(EntryName),
    /// Subdirectory missing from the destination is being created.
    CreatingDirectory(EntryName),
    /// Top-level run finished without error.
    RunCompleted,
    /// Run aborted on an error.
    RunFailed(String),
}

impl EventKind {
    /// Whether this event describes a change to the destination tree.
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Self::Copying(_) | Self::Updating(_) | Self::Deleting(_) | Self::CreatingDirectory(_)
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted => write!(f, "Synchronization started..."),
            Self::Copying(name) => write!(f, "Copying '{}'...", name),
            Self::Updating(name) => write!(f, "Updating '{}'...", name),
            Self::Deleting(name) => write!(f, "Deleting '{}'...", name),
            Self::CreatingDirectory(name) => {
                write!(f, "Creating directory '{}' in the destination folder.", name)
            }
            Self::RunCompleted => write!(f, "Synchronization completed."),
            Self::RunFailed(reason) => write!(f, "Synchronization failed: {}", reason),
        }
    }
}

/// A timestamped event.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
}

impl SyncEvent {
    /// Stamp `kind` with the current local time.
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
        }
    }

    /// Render as a log line, without trailing newline.
    pub fn to_line(&self) -> String {
        format!("{} - {}", self.timestamp.format(TIMESTAMP_FORMAT), self.kind)
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn name(s: &str) -> EntryName {
        EntryName::new(s).unwrap()
    }

    #[test]
    fn test_message_catalog() {
        assert_eq!(EventKind::RunStarted.to_string(), "Synchronization started...");
        assert_eq!(EventKind::Copying(name("a.txt")).to_string(), "Copying 'a.txt'...");
        assert_eq!(EventKind::Updating(name("a.txt")).to_string(), "Updating 'a.txt'...");
        assert_eq!(EventKind::Deleting(name("b.txt")).to_string(), "Deleting 'b.txt'...");
        assert_eq!(
            EventKind::CreatingDirectory(name("sub")).to_string(),
            "Creating directory 'sub' in the destination folder."
        );
        assert_eq!(EventKind::RunCompleted.to_string(), "Synchronization completed.");
        assert_eq!(
            EventKind::RunFailed("disk full".to_string()).to_string(),
            "Synchronization failed: disk full"
        );
    }

    #[test]
    fn test_line_format() {
        let event = SyncEvent {
            timestamp: Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap(),
            kind: EventKind::RunCompleted,
        };
        assert_eq!(event.to_line(), "07-03-2024 09:05:02 - Synchronization completed.");
    }

    #[test]
    fn test_is_action() {
        assert!(EventKind::Copying(name("x")).is_action());
        assert!(EventKind::CreatingDirectory(name("x")).is_action());
        assert!(!EventKind::RunStarted.is_action());
        assert!(!EventKind::RunFailed(String::new()).is_action());
    }
}
