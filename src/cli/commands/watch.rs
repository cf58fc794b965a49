//! Watch command implementation.
//!
//! Validates the three directories, starts the watch adapter and runs the
//! ingestion pipeline until Ctrl-C.

use crate::cli::prompt::PromptConfirm;
use crate::core::admission::ActiveSet;
use crate::core::ingest::{AutoConfirm, Confirm, IngestionStateMachine};
use crate::core::parser::NameParser;
use crate::core::pipeline::{self, PipelineSummary};
use crate::core::planner::PathPlanner;
use crate::core::scanner;
use crate::core::stabilizer::Stabilizer;
use crate::core::watcher::{ChangeEvent, WatchAdapter, CHANNEL_CAPACITY};
use crate::models::config::Config;
use crate::utils::fs::{ensure_directory, RealFs};
use crate::Result;
use colored::Colorize;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Directories the sorter works with.
#[derive(Debug, Clone, Copy)]
pub struct Directories<'a> {
    pub watch: &'a Path,
    pub movies: &'a Path,
    pub tv: &'a Path,
}

impl Directories<'_> {
    /// Fail unless every directory exists.
    pub fn validate(&self) -> Result<()> {
        for (label, dir) in [
            ("Watch", self.watch),
            ("Movies", self.movies),
            ("Television", self.tv),
        ] {
            ensure_directory(dir).map_err(|e| {
                crate::Error::other(format!("Unable to use {} directory: {}", label, e))
            })?;
        }
        Ok(())
    }
}

/// Watch `dirs.watch` until `shutdown` is cancelled.
pub async fn watch(
    dirs: Directories<'_>,
    config: &Config,
    shutdown: CancellationToken,
) -> Result<PipelineSummary> {
    dirs.validate()?;

    let parser = NameParser::with_extensions(&config.ingest.extensions);
    let planner = PathPlanner::new(dirs.movies, dirs.tv);
    let stabilizer = Stabilizer::from_config(&config.stabilizer);

    if config.ingest.auto_confirm {
        let machine = IngestionStateMachine::new(parser, planner, stabilizer, RealFs, AutoConfirm);
        run(dirs, config, machine, shutdown).await
    } else {
        let confirm = PromptConfirm::new(shutdown.clone());
        let machine = IngestionStateMachine::new(parser, planner, stabilizer, RealFs, confirm);
        run(dirs, config, machine, shutdown).await
    }
}

async fn run<C: Confirm>(
    dirs: Directories<'_>,
    config: &Config,
    machine: IngestionStateMachine<RealFs, C>,
    shutdown: CancellationToken,
) -> Result<PipelineSummary> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let backlog = if config.ingest.scan_existing {
        scanner::scan_existing(dirs.watch)?
    } else {
        Vec::new()
    };

    let adapter = WatchAdapter::start(dirs.watch, tx.clone())?;
    // The backlog can exceed the channel, so it must not block the pipeline.
    let feeder = feed_backlog(backlog, tx, shutdown.clone());

    println!("{}", "Media sorter is running!".bold().green());
    println!("  {} {}", "Watching:  ".bold(), adapter.dir().display());
    println!("  {} {}", "Movies:    ".bold(), dirs.movies.display());
    println!("  {} {}", "Television:".bold(), dirs.tv.display());
    println!();

    let summary = pipeline::run_pipeline(rx, &machine, ActiveSet::new(), shutdown).await;

    feeder.abort();
    drop(adapter);
    tracing::info!(
        "Stopped: {} admitted, {} relocated, {} rejected",
        summary.admitted,
        summary.relocated,
        summary.rejected
    );

    Ok(summary)
}

/// Send startup scan events from a separate task.
fn feed_backlog(
    events: Vec<ChangeEvent>,
    tx: mpsc::Sender<ChangeEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for event in events {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = tx.send(event) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
