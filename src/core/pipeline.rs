//! Ingestion pipeline.
//!
//! Two cooperating loops on one task:
//! - the dispatcher reads change events, runs admission and queues items
//! - the worker takes queued items one at a time through the state machine
//!
//! While the worker waits on a slow file the dispatcher keeps admitting
//! other files, but only one item is ever advanced at a time.

use crate::core::admission::{ActiveSet, Admission, Admitted};
use crate::core::ingest::{Confirm, IngestionStateMachine, Outcome, Rejection, Residual};
use crate::core::watcher::{ChangeEvent, ChangeKind};
use crate::utils::fs::FileSystem;
use crate::Error;
use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Counts reported when the pipeline stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Items that passed admission.
    pub admitted: usize,
    /// Items moved into the library.
    pub relocated: usize,
    /// Items dropped without reaching the library.
    pub rejected: usize,
}

/// Run until `events` closes or `shutdown` is cancelled.
///
/// Items still queued at shutdown are dropped untouched.
pub async fn run_pipeline<F: FileSystem, C: Confirm>(
    mut events: mpsc::Receiver<ChangeEvent>,
    machine: &IngestionStateMachine<F, C>,
    active: ActiveSet,
    shutdown: CancellationToken,
) -> PipelineSummary {
    let (work_tx, mut work_rx) = mpsc::unbounded_channel::<Admitted>();
    let mut admission = Admission::new(active, shutdown.clone());

    let dispatch_shutdown = shutdown.clone();
    let dispatch = async move {
        let mut admitted: usize = 0;
        loop {
            let event = tokio::select! {
                _ = dispatch_shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            // Late events for files that were already moved away.
            if event.kind == ChangeKind::Modified && !machine.fs().exists(&event.full_path) {
                tracing::trace!("Ignoring event for missing file: {}", event.name);
                continue;
            }

            if let Some(item) = admission.admit(&event) {
                admitted += 1;
                if work_tx.send(item).is_err() {
                    break;
                }
            }
        }
        admitted
    };

    let work = async move {
        let (mut relocated, mut rejected) = (0usize, 0usize);
        loop {
            let Admitted { item, guard } = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = work_rx.recv() => match next {
                    Some(next) => next,
                    None => break,
                },
            };

            let outcome = machine.run(item, guard.token()).await;
            report(&outcome);
            match outcome {
                Outcome::Relocated(_) => relocated += 1,
                Outcome::Rejected(_) => rejected += 1,
            }
            drop(guard);
        }
        (relocated, rejected)
    };

    let (admitted, (relocated, rejected)) = tokio::join!(dispatch, work);

    PipelineSummary {
        admitted,
        relocated,
        rejected,
    }
}

/// Print the outcome of one item for the operator.
pub fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Relocated(item) => {
            let dest = item
                .final_destination_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let elapsed = chrono::Utc::now() - item.detected_at;
            tracing::info!(
                "[{}] Relocated {} -> {} ({}s after detection)",
                item.id,
                item.original_name,
                dest,
                elapsed.num_seconds()
            );
            println!("{} File moved to {}", "[OK]".bold().green(), dest);
        }
        Outcome::Rejected(rejection) => report_rejection(rejection),
    }
}

fn report_rejection(rejection: &Rejection) {
    let name = &rejection.item.original_name;
    match &rejection.reason {
        // Anything that is not a video lands here; not worth a line.
        Error::UnsupportedExtension(_) => {
            tracing::debug!("Skipping non-video file: {}", name);
        }
        Error::Declined(_) => {
            tracing::info!("[{}] Rename declined: {}", rejection.item.id, name);
            println!(
                "{} Name unchanged. {} will not be processed further.",
                "[SKIP]".bold().yellow(),
                name
            );
        }
        _ => {
            tracing::warn!("[{}] Rejected {}: {}", rejection.item.id, name, rejection);
            println!("{} {}: {}", "[WARN]".bold().yellow(), name, rejection.reason);
            if let Residual::Renamed(path) = &rejection.residual {
                println!(
                    "       File was renamed but not moved; it is now at {}",
                    path.display().to_string().cyan()
                );
            }
        }
    }
}
