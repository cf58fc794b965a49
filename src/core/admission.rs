//! Admission control for change notifications.
//!
//! Filesystem notifications are noisy: one copy can produce a burst of
//! events for the same name. Two mechanisms keep each file from being
//! ingested twice at once:
//! - the active set, holding every name that is currently in flight
//! - a single-slot debounce per notification source

use crate::core::watcher::{ChangeEvent, ChangeKind};
use crate::models::media::MediaItem;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Last-write-wins memory of the most recent admitted name.
///
/// Clones share the slot, so a finished item can release it.
#[derive(Debug, Clone, Default)]
pub struct Debounce {
    recent: Arc<Mutex<Option<String>>>,
}

impl Debounce {
    /// Create an empty debounce slot.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.recent.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns true if `name` repeats the previous notification.
    ///
    /// A repeat clears the slot, so a third identical notification is
    /// treated as fresh again.
    pub fn is_repeat(&self, name: &str) -> bool {
        let mut recent = self.slot();
        if recent.as_deref() == Some(name) {
            *recent = None;
            true
        } else {
            *recent = Some(name.to_string());
            false
        }
    }

    /// Forget `name` if it is still the most recent one.
    pub fn release(&self, name: &str) {
        let mut recent = self.slot();
        if recent.as_deref() == Some(name) {
            *recent = None;
        }
    }
}

/// Names currently being ingested, each with a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    inner: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl ActiveSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `name` is in flight.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of names in flight.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Claim `name`. Returns `None` if it is already in flight.
    ///
    /// The claim is released when the returned guard is dropped.
    pub fn try_claim(&self, name: &str, parent: &CancellationToken) -> Option<ActiveGuard> {
        let mut map = self.lock();
        if map.contains_key(name) {
            return None;
        }
        let token = parent.child_token();
        map.insert(name.to_string(), token.clone());
        Some(ActiveGuard {
            set: self.clone(),
            name: name.to_string(),
            token,
            debounce: None,
        })
    }

    /// Cancel the in-flight item for `name`, if any.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().get(name) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Membership in the active set; removes itself on drop.
#[derive(Debug)]
pub struct ActiveGuard {
    set: ActiveSet,
    name: String,
    token: CancellationToken,
    debounce: Option<Debounce>,
}

impl ActiveGuard {
    /// Token cancelled when the source vanishes or on shutdown.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.name);
        // A later touch of the same file is a fresh request.
        if let Some(debounce) = &self.debounce {
            debounce.release(&self.name);
        }
    }
}

/// An item that passed admission, with its active-set claim.
#[derive(Debug)]
pub struct Admitted {
    /// Freshly created item.
    pub item: MediaItem,
    /// Claim on the item's name.
    pub guard: ActiveGuard,
}

/// Admission check for one notification source.
#[derive(Debug)]
pub struct Admission {
    active: ActiveSet,
    debounce: Debounce,
    shutdown: CancellationToken,
}

impl Admission {
    /// Create an admission check over a shared active set.
    pub fn new(active: ActiveSet, shutdown: CancellationToken) -> Self {
        Self {
            active,
            debounce: Debounce::new(),
            shutdown,
        }
    }

    /// Shared active set.
    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    /// Decide what to do with a change notification.
    ///
    /// Only `Modified` events create items. `Removed` events cancel the
    /// matching in-flight item.
    pub fn admit(&mut self, event: &ChangeEvent) -> Option<Admitted> {
        match event.kind {
            ChangeKind::Modified => {}
            ChangeKind::Removed => {
                if self.active.cancel(&event.name) {
                    tracing::debug!("Source removed while in flight: {}", event.name);
                }
                return None;
            }
            _ => return None,
        }

        if self.active.contains(&event.name) {
            tracing::trace!("Already in flight: {}", event.name);
            return None;
        }

        if self.debounce.is_repeat(&event.name) {
            tracing::trace!("Duplicate notification: {}", event.name);
            return None;
        }

        let mut guard = self.active.try_claim(&event.name, &self.shutdown)?;
        guard.debounce = Some(self.debounce.clone());
        let item = MediaItem::new(event.name.clone(), event.full_path.clone());
        tracing::debug!("[{}] Admitted {}", item.id, item.original_name);
        Some(Admitted { item, guard })
    }
}
