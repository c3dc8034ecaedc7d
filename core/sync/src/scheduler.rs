//! Periodic sync scheduling.
//!
//! The scheduler is a single loop that owns the job. Ticks and on-demand
//! requests are both handled by awaiting the job inline, so two runs can
//! never overlap: a tick that falls due during a run fires once the run
//! returns, and any further missed ticks are skipped.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use foldersync_common::{Error, Result};

use crate::tree::RunSummary;

/// Messages accepted by the scheduler loop.
#[derive(Debug)]
pub enum SyncRequest {
    /// Run immediately and reply with the outcome.
    RunNow(oneshot::Sender<Result<RunSummary>>),
    /// Stop after the current run, if any.
    Shutdown,
}

/// What triggered a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    Request,
}

/// Counters reported when the scheduler loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs_succeeded: usize,
    pub runs_failed: usize,
}

/// Control side of the scheduler.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
    request_tx: mpsc::Sender<SyncRequest>,
}

impl SyncScheduler {
    /// Create a scheduler firing every `period`.
    ///
    /// Returns the control side and the handle whose `run` drives the loop.
    ///
    /// # Errors
    /// - `period` is zero
    pub fn new(period: Duration) -> Result<(Self, SyncSchedulerHandle)> {
        if period.is_zero() {
            return Err(Error::InvalidInput(
                "Sync interval must be greater than zero".to_string(),
            ));
        }

        let (request_tx, request_rx) = mpsc::channel(16);

        let scheduler = Self {
            interval: period,
            request_tx,
        };
        let handle = SyncSchedulerHandle {
            interval: period,
            request_rx,
        };

        Ok((scheduler, handle))
    }

    /// Configured period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the loop is still accepting requests.
    pub fn is_running(&self) -> bool {
        !self.request_tx.is_closed()
    }

    /// Run now, waiting behind any run already in progress.
    pub async fn request_sync(&self) -> Result<RunSummary> {
        let (response_tx, response_rx) = oneshot::channel();

        self.request_tx
            .send(SyncRequest::RunNow(response_tx))
            .await
            .map_err(|_| Error::Scheduler("Scheduler not running".to_string()))?;

        response_rx
            .await
            .map_err(|_| Error::Scheduler("Failed to receive sync result".to_string()))?
    }

    /// Ask the loop to stop. An in-progress run is allowed to finish.
    pub async fn shutdown(&self) {
        if self.request_tx.send(SyncRequest::Shutdown).await.is_err() {
            debug!("Scheduler already stopped");
        }
    }
}

/// Loop side of the scheduler.
#[derive(Debug)]
pub struct SyncSchedulerHandle {
    interval: Duration,
    request_rx: mpsc::Receiver<SyncRequest>,
}

impl SyncSchedulerHandle {
    /// Drive the scheduler until shutdown.
    ///
    /// The first run starts immediately; later ticks are spaced `interval`
    /// apart from that start. A failed run is logged and the loop carries on
    /// with the next tick. The loop also stops once every `SyncScheduler`
    /// has been dropped.
    pub async fn run<F, Fut>(mut self, mut job: F) -> SchedulerStats
    where
        F: FnMut(Trigger) -> Fut + Send,
        Fut: Future<Output = Result<RunSummary>> + Send,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats = SchedulerStats::default();

        info!("Sync scheduler started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                biased;

                request = self.request_rx.recv() => match request {
                    Some(SyncRequest::RunNow(response_tx)) => {
                        debug!("Processing on-demand sync request");
                        let result = job(Trigger::Request).await;
                        Self::note(&mut stats, Trigger::Request, &result);
                        let _ = response_tx.send(result);
                    }
                    Some(SyncRequest::Shutdown) => {
                        info!("Received shutdown request");
                        break;
                    }
                    None => {
                        info!("All scheduler controls dropped");
                        break;
                    }
                },

                _ = ticker.tick() => {
                    debug!("Triggering periodic sync");
                    let result = job(Trigger::Tick).await;
                    Self::note(&mut stats, Trigger::Tick, &result);
                }
            }
        }

        info!(
            "Sync scheduler stopped: {} succeeded, {} failed",
            stats.runs_succeeded, stats.runs_failed
        );
        stats
    }

    fn note(stats: &mut SchedulerStats, trigger: Trigger, result: &Result<RunSummary>) {
        match result {
            Ok(summary) => {
                stats.runs_succeeded += 1;
                info!(
                    "{:?} sync completed: {} changes, {} bytes in {:?}",
                    trigger,
                    summary.changes(),
                    summary.bytes_transferred,
                    summary.duration
                );
            }
            Err(e) => {
                stats.runs_failed += 1;
                error!("{:?} sync failed: {}", trigger, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::{sleep, Instant};

    fn ok() -> Result<RunSummary> {
        Ok(RunSummary::default())
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(SyncScheduler::new(Duration::ZERO).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_is_immediate_then_periodic() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(10)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = tokio::spawn(handle.run(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ok()
            }
        }));

        sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(25)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        scheduler.shutdown().await;
        let stats = task.await.unwrap();
        assert_eq!(stats.runs_succeeded, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_runs_never_overlap() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(10)).unwrap();
        let spans: Arc<Mutex<Vec<(Instant, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let (spans_c, active_c, max_c) = (spans.clone(), active.clone(), max_active.clone());
        let task = tokio::spawn(handle.run(move |_| {
            let spans = spans_c.clone();
            let active = active_c.clone();
            let max_active = max_c.clone();
            async move {
                let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now_active, Ordering::SeqCst);
                let start = Instant::now();
                sleep(Duration::from_secs(25)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                spans.lock().unwrap().push((start, Instant::now()));
                ok()
            }
        }));

        sleep(Duration::from_secs(80)).await;
        scheduler.shutdown().await;
        task.await.unwrap();

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        let spans = spans.lock().unwrap();
        assert!(spans.len() >= 3);
        for pair in spans.windows(2) {
            assert!(pair[1].0 >= pair[0].1);
        }
        // The overdue tick fires as soon as the previous run ends.
        assert_eq!(spans[1].0, spans[0].1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_does_not_stop_scheduler() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(5)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let task = tokio::spawn(handle.run(move |_| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::NotFound("source vanished".to_string()))
                } else {
                    ok()
                }
            }
        }));

        sleep(Duration::from_secs(11)).await;
        scheduler.shutdown().await;
        let stats = task.await.unwrap();

        assert_eq!(stats.runs_failed, 1);
        assert_eq!(stats.runs_succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_sync_returns_result() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(3600)).unwrap();
        let task = tokio::spawn(handle.run(|trigger| async move {
            Ok(RunSummary {
                files_copied: if trigger == Trigger::Request { 7 } else { 0 },
                ..RunSummary::default()
            })
        }));

        let summary = scheduler.request_sync().await.unwrap();
        assert_eq!(summary.files_copied, 7);

        scheduler.shutdown().await;
        let stats = task.await.unwrap();
        assert_eq!(stats.runs_succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_active_run() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(60)).unwrap();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let task = tokio::spawn(handle.run(move |_| {
            let flag = flag.clone();
            async move {
                sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                ok()
            }
        }));

        sleep(Duration::from_secs(1)).await;
        scheduler.shutdown().await;
        let stats = task.await.unwrap();

        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(stats.runs_succeeded, 1);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_after_shutdown_fails() {
        let (scheduler, handle) = SyncScheduler::new(Duration::from_secs(60)).unwrap();
        let task = tokio::spawn(handle.run(|_| async { ok() }));

        scheduler.shutdown().await;
        task.await.unwrap();

        assert!(matches!(
            scheduler.request_sync().await,
            Err(Error::Scheduler(_))
        ));
    }
}
