//! Notification count: the number of pending updates, projected from the store.

use tokio::sync::watch;

use crate::{Snapshot, UpdateStore};

/// Badge text for `count` pending updates; `None` hides the badge.
pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1 => Some("1 new update".to_string()),
        n => Some(format!("{n} new updates")),
    }
}

/// Read-only projection of store size for a presentation layer.
pub struct NotificationCounter {
    rx: watch::Receiver<Snapshot>,
    last: usize,
}

impl NotificationCounter {
    pub fn new(store: &UpdateStore) -> Self {
        let rx = store.subscribe();
        let last = rx.borrow().len();
        Self { rx, last }
    }

    pub fn count(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn label(&self) -> Option<String> {
        badge_label(self.count())
    }

    /// Wait until the count differs from the last one reported.
    ///
    /// Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<usize> {
        loop {
            self.rx.changed().await.ok()?;
            let count = self.rx.borrow_and_update().len();
            if count != self.last {
                self.last = count;
                return Some(count);
            }
        }
    }
}
