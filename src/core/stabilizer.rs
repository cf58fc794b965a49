//! File stabilizer module.
//!
//! Polls a freshly-noticed file until it can be opened exclusively and has a
//! non-zero length, so a partially copied file is never renamed or moved.
//!
//! The check is inherently racy against other writers; the later
//! rename/move steps re-check and fail cleanly if the file goes away.

use crate::models::config::StabilizerConfig;
use crate::utils::fs::FileSystem;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a stabilization wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stabilization {
    /// Open succeeded and the file has data.
    Available,
    /// The attempt bound was reached first.
    TimedOut { attempts: u32 },
    /// The wait was cancelled (source removed or shutdown).
    Cancelled,
}

/// Polls files until they are fully written.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    poll_interval: Duration,
    max_attempts: Option<u32>,
}

impl Stabilizer {
    /// Create a stabilizer. `max_attempts = None` polls forever.
    pub fn new(poll_interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            poll_interval,
            max_attempts,
        }
    }

    /// Create a stabilizer from configuration.
    pub fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(config.poll_interval(), config.max_attempts)
    }

    /// Single readiness check.
    pub fn is_ready<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> bool {
        match fs.open_exclusive(path) {
            Ok(len) => len > 0,
            Err(e) => {
                tracing::trace!("Not ready {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Wait until `path` is available, the bound is hit, or `cancel` fires.
    pub async fn await_available<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Stabilization {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Stabilization::Cancelled;
            }

            attempts = attempts.saturating_add(1);
            if Self::is_ready(fs, path) {
                tracing::debug!("{} available after {} attempt(s)", path.display(), attempts);
                return Stabilization::Available;
            }

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Stabilization::TimedOut { attempts };
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Stabilization::Cancelled,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::from_config(&StabilizerConfig::default())
    }
}
