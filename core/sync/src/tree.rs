//! Recursive one-way tree synchronization.
//!
//! Each directory level runs three passes against the matching destination
//! directory:
//! 1. Source files: copy the missing ones and overwrite the ones that differ.
//! 2. Destination files: delete the ones the source no longer has.
//! 3. Source subdirectories: create the missing ones, then recurse into each.
//!
//! Destination subdirectories without a source counterpart are left alone.
//! Any I/O error aborts the whole run.

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info};

use foldersync_common::{EntryName, Error, Result, SyncPair};

use crate::compare::files_equal;
use crate::event::{EventKind, SyncEvent};
use crate::journal::EventSink;
use crate::transfer::copy_file;

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_copied: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
    pub directories_created: usize,
    pub bytes_transferred: u64,
    pub duration: Duration,
}

impl RunSummary {
    /// Total number of changes applied to the destination.
    pub fn changes(&self) -> usize {
        self.files_copied + self.files_updated + self.files_deleted + self.directories_created
    }
}

/// Files and subdirectories of one directory.
#[derive(Debug, Default)]
struct DirListing {
    files: Vec<EntryName>,
    dirs: Vec<EntryName>,
}

impl DirListing {
    async fn read(path: &Path, sorted: bool) -> Result<Self> {
        let mut listing = Self::default();
        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| Error::filesystem("list", path, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::filesystem("list", path, e))?
        {
            let entry_path = entry.path();
            let name = match EntryName::new(entry.file_name()) {
                Ok(name) => name,
                Err(e) => {
                    debug!("Skipping {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            let mut file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::filesystem("inspect", &entry_path, e))?;

            if file_type.is_symlink() {
                match fs::metadata(&entry_path).await {
                    Ok(target) => file_type = target.file_type(),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!("Skipping dangling symlink {}", entry_path.display());
                        continue;
                    }
                    Err(e) => return Err(Error::filesystem("inspect", &entry_path, e)),
                }
            }

            if file_type.is_file() {
                listing.files.push(name);
            } else if file_type.is_dir() {
                listing.dirs.push(name);
            } else {
                debug!("Skipping special file {}", entry_path.display());
            }
        }

        if sorted {
            listing.files.sort();
            listing.dirs.sort();
        }

        Ok(listing)
    }

    fn file_set(&self) -> HashSet<&EntryName> {
        self.files.iter().collect()
    }

    fn dir_set(&self) -> HashSet<&EntryName> {
        self.dirs.iter().collect()
    }
}

/// Mirrors a source tree into a destination tree.
#[derive(Debug, Clone)]
pub struct TreeSynchronizer {
    sorted: bool,
}

impl Default for TreeSynchronizer {
    fn default() -> Self {
        Self { sorted: true }
    }
}

impl TreeSynchronizer {
    /// Create a synchronizer that visits entries in name order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit entries sorted by name (`true`) or in filesystem order.
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Whether entries are visited in name order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Run one full synchronization of `pair`.
    ///
    /// # Preconditions
    /// - `pair.source()` must be an existing directory
    ///
    /// # Postconditions
    /// - The destination root exists
    /// - On success, every source file has an identical copy in the
    ///   destination and destination files without a source counterpart
    ///   are gone
    ///
    /// # Errors
    /// - Any listing, comparison, copy, delete or mkdir failure; the run
    ///   stops at the first one
    pub async fn run<S>(&self, pair: &SyncPair, sink: &mut S) -> Result<RunSummary>
    where
        S: EventSink + ?Sized,
    {
        let started = Instant::now();

        let source_meta = fs::metadata(pair.source())
            .await
            .map_err(|e| Error::filesystem("open", pair.source(), e))?;
        if !source_meta.is_dir() {
            return Err(Error::NotADirectory(pair.source().display().to_string()));
        }

        if !fs::try_exists(pair.destination()).await.unwrap_or(false) {
            debug!("Creating destination root {}", pair.destination().display());
            fs::create_dir_all(pair.destination())
                .await
                .map_err(|e| Error::filesystem("create", pair.destination(), e))?;
        }

        let mut summary = RunSummary::default();
        self.sync_tree(pair, true, &mut *sink, &mut summary).await?;
        summary.duration = started.elapsed();

        info!(
            "Synchronized {}: {} copied, {} updated, {} deleted, {} directories created",
            pair,
            summary.files_copied,
            summary.files_updated,
            summary.files_deleted,
            summary.directories_created
        );

        Ok(summary)
    }

    /// Synchronize one directory level and everything below it.
    ///
    /// Start and completion events are only emitted when `top_level` is set.
    pub fn sync_tree<'a, S>(
        &'a self,
        pair: &'a SyncPair,
        top_level: bool,
        sink: &'a mut S,
        summary: &'a mut RunSummary,
    ) -> BoxFuture<'a, Result<()>>
    where
        S: EventSink + ?Sized + 'a,
    {
        async move {
            if top_level {
                sink.record(SyncEvent::now(EventKind::RunStarted)).await?;
            }

            let source = DirListing::read(pair.source(), self.sorted).await?;
            let destination = DirListing::read(pair.destination(), self.sorted).await?;

            self.copy_files(pair, &source, &destination, &mut *sink, &mut *summary)
                .await?;
            self.delete_files(pair, &source, &destination, &mut *sink, &mut *summary)
                .await?;

            let existing_dirs = destination.dir_set();
            for name in &source.dirs {
                let child = pair.child(name);

                if !existing_dirs.contains(name) {
                    sink.record(SyncEvent::now(EventKind::CreatingDirectory(name.clone())))
                        .await?;
                    fs::create_dir(child.destination())
                        .await
                        .map_err(|e| Error::filesystem("create", child.destination(), e))?;
                    summary.directories_created += 1;
                }

                self.sync_tree(&child, false, &mut *sink, &mut *summary)
                    .await?;
            }

            if top_level {
                sink.record(SyncEvent::now(EventKind::RunCompleted)).await?;
            }

            Ok(())
        }
        .boxed()
    }

    async fn copy_files<S>(
        &self,
        pair: &SyncPair,
        source: &DirListing,
        destination: &DirListing,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        let existing = destination.file_set();

        for name in &source.files {
            let from = pair.source().join(name);
            let to = pair.destination().join(name);

            if !existing.contains(name) {
                sink.record(SyncEvent::now(EventKind::Copying(name.clone())))
                    .await?;
                summary.bytes_transferred += copy_file(&from, &to).await?;
                summary.files_copied += 1;
            } else if !files_equal(&from, &to).await? {
                sink.record(SyncEvent::now(EventKind::Updating(name.clone())))
                    .await?;
                summary.bytes_transferred += copy_file(&from, &to).await?;
                summary.files_updated += 1;
            } else {
                debug!("Unchanged: {}", to.display());
            }
        }

        Ok(())
    }

    async fn delete_files<S>(
        &self,
        pair: &SyncPair,
        source: &DirListing,
        destination: &DirListing,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        let wanted = source.file_set();

        for name in &destination.files {
            if wanted.contains(name) {
                continue;
            }

            let target = pair.destination().join(name);
            sink.record(SyncEvent::now(EventKind::Deleting(name.clone())))
                .await?;
            fs::remove_file(&target)
                .await
                .map_err(|e| Error::filesystem("delete", &target, e))?;
            summary.files_deleted += 1;
        }

        Ok(())
    }
}
