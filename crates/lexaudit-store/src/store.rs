//! In-memory store for one review session.
//!
//! The store publishes an immutable [`Snapshot`] through a `watch` channel.
//! Every mutation builds the next snapshot inside the channel's write lock, so
//! subscribers never see a list whose selection points at a missing record.

use std::sync::Arc;

use lexaudit_core::{Update, UpdateId};
use tokio::sync::watch;
use tracing::debug;

use crate::StoreError;
use crate::selection;

/// Immutable view of the review session at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Pending updates in server response order.
    pub updates: Arc<[Update]>,
    /// Invariant: `None` or the id of an element of `updates`.
    pub selected: Option<UpdateId>,
    /// A list fetch is in flight.
    pub loading: bool,
    /// An accept/reject is in flight.
    pub processing: bool,
    /// Bumped on every published change.
    pub version: u64,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn get(&self, id: &UpdateId) -> Option<&Update> {
        self.updates.iter().find(|u| &u.id == id)
    }

    pub fn contains(&self, id: &UpdateId) -> bool {
        self.get(id).is_some()
    }

    pub fn selected_update(&self) -> Option<&Update> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }
}

/// Single source of truth for pending updates and the current selection.
#[derive(Debug)]
pub struct UpdateStore {
    tx: watch::Sender<Snapshot>,
}

impl Default for UpdateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// Subscribe to snapshots. The receiver starts at the current one.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn selected(&self) -> Option<UpdateId> {
        self.tx.borrow().selected.clone()
    }

    pub fn get(&self, id: &UpdateId) -> Result<Update, StoreError> {
        self.tx
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Replace the whole list with `updates`, keeping their order.
    ///
    /// The selection survives if its id is still listed; otherwise it is
    /// cleared and the default rule picks the first update.
    pub fn replace_all(&self, updates: Vec<Update>) {
        self.tx.send_modify(|snap| {
            let selected = selection::reconcile(&updates, snap.selected.as_ref());
            if selected != snap.selected {
                debug!(from = ?snap.selected, to = ?selected, "selection reconciled");
            }
            snap.updates = updates.into();
            snap.selected = selected;
            snap.version += 1;
        });
    }

    /// Remove `id` from the list. Returns whether anything was removed.
    ///
    /// Removing the selected update moves the selection to the default.
    pub fn remove(&self, id: &UpdateId) -> bool {
        self.tx.send_if_modified(|snap| {
            if !snap.contains(id) {
                return false;
            }
            let remaining: Vec<Update> =
                snap.updates.iter().filter(|u| &u.id != id).cloned().collect();
            let current = snap.selected.as_ref().filter(|sel| *sel != id);
            snap.selected = selection::reconcile(&remaining, current);
            snap.updates = remaining.into();
            snap.version += 1;
            true
        })
    }

    /// Select `id` if it is listed; otherwise leave the selection alone.
    pub fn select(&self, id: &UpdateId) -> bool {
        self.tx.send_if_modified(|snap| {
            match selection::explicit(&snap.updates, id) {
                Some(next) if snap.selected.as_ref() != Some(&next) => {
                    snap.selected = Some(next);
                    snap.version += 1;
                    true
                }
                _ => false,
            }
        });
        self.tx.borrow().selected.as_ref() == Some(id)
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_if_modified(|snap| {
            if snap.loading == loading {
                return false;
            }
            snap.loading = loading;
            snap.version += 1;
            true
        });
    }

    /// Claim the single mutation slot. Returns `false` if it is already held.
    pub fn try_begin_processing(&self) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.processing {
                return false;
            }
            snap.processing = true;
            snap.version += 1;
            true
        })
    }

    pub fn finish_processing(&self) {
        self.tx.send_if_modified(|snap| {
            if !snap.processing {
                return false;
            }
            snap.processing = false;
            snap.version += 1;
            true
        });
    }
}
