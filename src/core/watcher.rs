//! Watch directory adapter.
//!
//! Bridges `notify` filesystem events into a tokio channel of
//! [`ChangeEvent`]s. The watch is non-recursive: only files dropped directly
//! into the watch directory are considered.

use crate::Result;
use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Capacity of the bridge channel between notify and the dispatcher.
pub const CHANNEL_CAPACITY: usize = 256;

/// Kind of change, reduced to what ingestion cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
    Other,
}

/// One "path changed" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// File name without directory.
    pub name: String,
    /// Full path to the file.
    pub full_path: PathBuf,
    /// What happened.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Build an event for `path`. Returns `None` for paths without a file name.
    pub fn from_path(path: &Path, kind: ChangeKind) -> Option<Self> {
        let name = crate::utils::fs::file_name(path)?;
        Some(Self {
            name,
            full_path: path.to_path_buf(),
            kind,
        })
    }
}

/// Map a notify event kind onto a [`ChangeKind`].
pub fn classify_event_kind(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => ChangeKind::Other,
    }
}

/// Split a notify event into one [`ChangeEvent`] per path.
pub fn change_events(event: &notify::Event) -> Vec<ChangeEvent> {
    let kind = classify_event_kind(&event.kind);
    event
        .paths
        .iter()
        .filter_map(|path| ChangeEvent::from_path(path, kind))
        .collect()
}

/// Keeps the OS watch alive; dropping it stops event delivery.
pub struct WatchAdapter {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl WatchAdapter {
    /// Start watching `dir`, sending every change into `tx`.
    pub fn start(dir: &Path, tx: mpsc::Sender<ChangeEvent>) -> Result<Self> {
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for change in change_events(&event) {
                        // Receiver gone means we are shutting down.
                        if tx.blocking_send(change).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!("Filesystem watcher error: {}", e),
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching directory: {}", dir.display());

        Ok(Self {
            _watcher: watcher,
            dir: dir.to_path_buf(),
        })
    }

    /// Watched directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl std::fmt::Debug for WatchAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchAdapter").field("dir", &self.dir).finish()
    }
}
