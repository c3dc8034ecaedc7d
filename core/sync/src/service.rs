//! Run boundary: one journal per run, failures recorded, scheduler wiring.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

use foldersync_common::{Result, SyncPair};

use crate::config::SyncConfig;
use crate::event::{EventKind, SyncEvent};
use crate::journal::{EventLog, EventSink};
use crate::scheduler::{SchedulerStats, SyncScheduler};
use crate::tree::{RunSummary, TreeSynchronizer};

/// Mirrors one pair, logging each run to an event log.
#[derive(Debug, Clone)]
pub struct SyncService {
    pair: SyncPair,
    synchronizer: TreeSynchronizer,
    log: EventLog,
}

impl SyncService {
    pub fn new(pair: SyncPair, synchronizer: TreeSynchronizer, log: EventLog) -> Self {
        Self {
            pair,
            synchronizer,
            log,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.pair(), config.synchronizer(), config.event_log())
    }

    pub fn pair(&self) -> &SyncPair {
        &self.pair
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Perform one run.
    ///
    /// The journal is closed whether or not the run succeeds. A failed run
    /// is recorded in the journal before the error is returned.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let mut journal = self.log.open_run().await?;

        let result = self.synchronizer.run(&self.pair, &mut journal).await;

        if let Err(e) = &result {
            let failure = SyncEvent::now(EventKind::RunFailed(e.to_string()));
            if let Err(log_err) = journal.record(failure).await {
                warn!("Could not record failed run: {}", log_err);
            }
        }

        let closed = journal.close().await;
        let summary = result?;
        closed?;
        Ok(summary)
    }

    /// Start periodic runs on the current runtime.
    ///
    /// Returns the scheduler control and the task driving it; the task
    /// resolves once the scheduler is shut down.
    pub fn start(
        self: Arc<Self>,
        period: Duration,
    ) -> Result<(SyncScheduler, JoinHandle<SchedulerStats>)> {
        let (scheduler, handle) = SyncScheduler::new(period)?;

        let task = tokio::spawn(handle.run(move |_| {
            let service = self.clone();
            async move { service.run_once().await }
        }));

        Ok((scheduler, task))
    }
}
