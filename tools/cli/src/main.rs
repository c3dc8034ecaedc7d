//! FolderSync CLI - periodically mirror one folder into another.
//!
//! Usage: `foldersync <source-folder> <destination-folder> <interval-seconds>`

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use foldersync_sync::{SyncConfig, SyncService, DEFAULT_LOG_PATH};

#[derive(Parser)]
#[command(name = "foldersync")]
#[command(about = "FolderSync - One-way periodic folder mirroring")]
#[command(version)]
struct Cli {
    /// Folder to mirror from.
    source: PathBuf,

    /// Folder to mirror into; created if missing.
    destination: PathBuf,

    /// Seconds between synchronization runs (positive integer).
    #[arg(allow_negative_numbers = true)]
    interval: String,

    /// Append-only event log.
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    log_file: PathBuf,

    /// Do not echo events to stdout.
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Run a single synchronization and exit.
    #[arg(long)]
    once: bool,

    /// Visit entries in filesystem order instead of by name.
    #[arg(long)]
    unsorted: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&cli)?;

    if cli.once {
        cmd_once(&config).await
    } else {
        cmd_watch(&config).await
    }
}

/// Validate arguments and prepare the destination folder.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    // Non-numeric and negative input both end up as zero and fail validation.
    let interval_secs = cli.interval.trim().parse::<u64>().unwrap_or(0);

    let config = SyncConfig::new(&cli.source, &cli.destination, interval_secs)
        .with_log_path(&cli.log_file)
        .with_echo(!cli.quiet)
        .with_sorted(!cli.unsorted);

    config.validate_source()?;

    if !config.destination.is_dir() {
        println!(
            "Destination folder '{}' does not exist. Creating it...",
            config.destination.display()
        );
    }
    config
        .prepare_destination()
        .context("Failed to create destination folder")?;

    config.validate_interval()?;

    Ok(config)
}

/// Run a single synchronization.
async fn cmd_once(config: &SyncConfig) -> Result<()> {
    let service = SyncService::from_config(config);
    let summary = service.run_once().await.context("Synchronization failed")?;

    info!(
        "Done: {} copied, {} updated, {} deleted, {} directories created",
        summary.files_copied,
        summary.files_updated,
        summary.files_deleted,
        summary.directories_created
    );
    Ok(())
}

/// Synchronize periodically until the operator asks to stop.
async fn cmd_watch(config: &SyncConfig) -> Result<()> {
    let service = Arc::new(SyncService::from_config(config));

    println!(
        "Synchronization started. Sync interval: {} seconds",
        config.interval_secs
    );
    let (scheduler, task) = service.start(config.interval())?;

    println!("Press Enter to exit.");
    wait_for_exit().await?;

    scheduler.shutdown().await;
    let stats = task.await.context("Scheduler task panicked")?;
    debug!(
        "Scheduler finished: {} succeeded, {} failed",
        stats.runs_succeeded, stats.runs_failed
    );

    println!(
        "Synchronization complete. Log written to '{}'.",
        config.log_path().display()
    );
    Ok(())
}

/// Wait for Enter on stdin or Ctrl-C.
///
/// Stdin is read on a plain thread so a pending read never holds up runtime
/// shutdown. A closed stdin leaves Ctrl-C as the only way out.
async fn wait_for_exit() -> Result<()> {
    let (enter_tx, enter_rx) = oneshot::channel();

    std::thread::spawn(move || {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(n) if n > 0 => {
                let _ = enter_tx.send(());
            }
            _ => debug!("stdin closed; waiting for Ctrl-C"),
        }
    });

    let enter = async {
        if enter_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = enter => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
        }
    }

    Ok(())
}
