//! Ingestion state machine.
//!
//! Drives one item at a time through:
//!
//! `Detected → Stabilizing → Classified → AwaitingConfirmation → Renaming → Moving → Done`
//!
//! Any step may end in `Rejected`. Each filesystem mutation is preceded by an
//! existence check on its target and is never retried, so a pre-existing
//! file is never overwritten.

use crate::core::parser::NameParser;
use crate::core::planner::{self, PathPlanner};
use crate::core::stabilizer::{Stabilization, Stabilizer};
use crate::error::CollisionScope;
use crate::models::media::MediaItem;
use crate::utils::fs::FileSystem;
use crate::Error;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Where an item is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Detected,
    Stabilizing,
    Classified,
    AwaitingConfirmation,
    Renaming,
    Moving,
    Done,
    Rejected,
}

impl std::fmt::Display for IngestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IngestState::Detected => "detected",
            IngestState::Stabilizing => "stabilizing",
            IngestState::Classified => "classified",
            IngestState::AwaitingConfirmation => "awaiting confirmation",
            IngestState::Renaming => "renaming",
            IngestState::Moving => "moving",
            IngestState::Done => "done",
            IngestState::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// What is left on disk after a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Residual {
    /// The file is still at its original path.
    Untouched(PathBuf),
    /// The file was renamed in the watch directory but not moved.
    Renamed(PathBuf),
}

impl Residual {
    /// Path where the file now lives.
    pub fn path(&self) -> &Path {
        match self {
            Residual::Untouched(p) | Residual::Renamed(p) => p,
        }
    }
}

/// A rejected item with the reason and the state it failed in.
#[derive(Debug)]
pub struct Rejection {
    /// The item as far as it got.
    pub item: MediaItem,
    /// State the item was in when it was rejected.
    pub state: IngestState,
    /// Why it was rejected.
    pub reason: Error,
    /// Where the file was left.
    pub residual: Residual,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (while {})", self.reason, self.state)?;
        if let Residual::Renamed(path) = &self.residual {
            write!(f, "; file left renamed at {}", path.display())?;
        }
        Ok(())
    }
}

/// Result of ingesting one item.
#[derive(Debug)]
pub enum Outcome {
    /// Moved into the library; `final_destination_path` is set.
    Relocated(MediaItem),
    /// Dropped without reaching the library.
    Rejected(Rejection),
}

impl Outcome {
    /// Whether the item reached the library.
    pub fn is_relocated(&self) -> bool {
        matches!(self, Outcome::Relocated(_))
    }
}

/// Yes/no decision on a proposed rename.
pub trait Confirm: Send + Sync {
    /// Approve or decline renaming `item` to its proposed name.
    fn confirm(&self, item: &MediaItem) -> impl Future<Output = bool> + Send;
}

/// Approves every rename.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    async fn confirm(&self, item: &MediaItem) -> bool {
        tracing::debug!("Auto-approving {}", item.original_name);
        true
    }
}

/// Whether a confirmation answer means "yes": it contains a `y`, any case.
pub fn is_affirmative(answer: &str) -> bool {
    answer.to_lowercase().contains('y')
}

/// Sequences classification, confirmation, rename and move for one item.
pub struct IngestionStateMachine<F, C> {
    parser: NameParser,
    planner: PathPlanner,
    stabilizer: Stabilizer,
    fs: F,
    confirm: C,
}

impl<F: FileSystem, C: Confirm> IngestionStateMachine<F, C> {
    /// Create a state machine from its collaborators.
    pub fn new(
        parser: NameParser,
        planner: PathPlanner,
        stabilizer: Stabilizer,
        fs: F,
        confirm: C,
    ) -> Self {
        Self {
            parser,
            planner,
            stabilizer,
            fs,
            confirm,
        }
    }

    /// Filesystem the machine operates on.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Run `item` to completion.
    ///
    /// `cancel` aborts a pending stabilization wait, for example when the
    /// watched file is deleted.
    pub async fn run(&self, mut item: MediaItem, cancel: &CancellationToken) -> Outcome {
        let mut state = IngestState::Detected;
        let original = item.original_path.clone();

        // Detected → Stabilizing
        advance(&item, &mut state, IngestState::Stabilizing);
        // Non-video files never wait on the stabilizer.
        if !self.parser.is_supported(&item.original_name) {
            let reason = Error::UnsupportedExtension(item.original_name.clone());
            return reject(item, state, reason, Residual::Untouched(original));
        }
        match self
            .stabilizer
            .await_available(&self.fs, &original, cancel)
            .await
        {
            Stabilization::Available => item.available = true,
            Stabilization::TimedOut { attempts } => {
                let reason = Error::StabilizationTimeout {
                    path: original.display().to_string(),
                    attempts,
                };
                return reject(item, state, reason, Residual::Untouched(original));
            }
            Stabilization::Cancelled => {
                let reason = if self.fs.exists(&original) {
                    Error::other(format!("Ingestion of {} was interrupted", item.original_name))
                } else {
                    Error::SourceVanished(original.display().to_string())
                };
                return reject(item, state, reason, Residual::Untouched(original));
            }
        }

        // Stabilizing → Classified
        let parsed = match self.parser.parse(&item.original_name) {
            Ok(parsed) => parsed,
            Err(e) => return reject(item, state, e, Residual::Untouched(original)),
        };
        item.content_type = parsed.content_type;
        item.title = Some(parsed.title);
        item.year = parsed.year;
        item.episode_tag = parsed.episode_tag;
        item.extension = Some(parsed.extension);
        advance(&item, &mut state, IngestState::Classified);

        // Classified → AwaitingConfirmation
        let planned = planner::proposed_name(&item)
            .and_then(|name| Ok((name, self.planner.plan(&item)?)));
        let (name, destination) = match planned {
            Ok(planned) => planned,
            Err(e) => return reject(item, state, e, Residual::Untouched(original)),
        };
        let renamed = item.source_dir().join(&name);
        item.proposed_name = Some(name);
        item.proposed_path = Some(renamed.clone());
        item.destination_path = Some(destination.clone());
        advance(&item, &mut state, IngestState::AwaitingConfirmation);

        if !self.confirm.confirm(&item).await {
            let reason = Error::Declined(item.original_name.clone());
            return reject(item, state, reason, Residual::Untouched(original));
        }

        // AwaitingConfirmation → Renaming
        advance(&item, &mut state, IngestState::Renaming);
        if renamed != original {
            if self.fs.exists(&renamed) {
                let reason = Error::NameCollision {
                    scope: CollisionScope::Source,
                    path: renamed,
                };
                return reject(item, state, reason, Residual::Untouched(original));
            }
            if let Err(e) = self.fs.rename(&original, &renamed) {
                let reason = Error::from_io(&original, e);
                return reject(item, state, reason, Residual::Untouched(original));
            }
            tracing::info!("Renamed {} -> {}", item.original_name, renamed.display());
        }

        // Renaming → Moving
        advance(&item, &mut state, IngestState::Moving);
        let staged = staged_residual(&original, renamed);
        if self.fs.exists(&destination) {
            let reason = Error::NameCollision {
                scope: CollisionScope::Destination,
                path: destination,
            };
            return reject(item, state, reason, staged);
        }
        if let Some(parent) = destination.parent() {
            if !self.fs.exists(parent) {
                if let Err(e) = self.fs.create_dir_all(parent) {
                    let reason = Error::from_io(parent, e);
                    return reject(item, state, reason, staged);
                }
            }
        }
        if let Err(e) = self.fs.move_file(staged.path(), &destination) {
            let reason = Error::from_io(staged.path(), e);
            return reject(item, state, reason, staged);
        }

        // Moving → Done
        item.final_destination_path = Some(destination);
        advance(&item, &mut state, IngestState::Done);
        Outcome::Relocated(item)
    }
}

/// Where the file sits between the rename and the move.
fn staged_residual(original: &Path, renamed: PathBuf) -> Residual {
    if renamed == original {
        Residual::Untouched(renamed)
    } else {
        Residual::Renamed(renamed)
    }
}

fn advance(item: &MediaItem, state: &mut IngestState, next: IngestState) {
    tracing::debug!("[{}] {}: {} -> {}", item.id, item.original_name, state, next);
    *state = next;
}

fn reject(item: MediaItem, state: IngestState, reason: Error, residual: Residual) -> Outcome {
    tracing::debug!(
        "[{}] {}: {} -> {} ({})",
        item.id,
        item.original_name,
        state,
        IngestState::Rejected,
        reason
    );
    Outcome::Rejected(Rejection {
        item,
        state,
        reason,
        residual,
    })
}
