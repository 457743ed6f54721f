//! One reviewer's session: store, poller, and dispatcher wired together.
//!
//! Every failure returned from a session operation is also queued as a
//! [`Notice`] so an interactive front end can show it until dismissed.
//! Failures of background poll ticks arrive through [`ReviewSession::next_notice`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lexaudit_core::{
    AuditEntry, CrawlSummary, Decision, TaxScheme, Update, UpdateId, validate_crawl_url,
};
use lexaudit_store::{NotificationCounter, UpdateStore};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatch::{ResolveOutcome, ReviewDispatcher};
use crate::poller::{Poller, RefreshOutcome};
use crate::{ReviewApi, ReviewError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible message describing a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl From<&ReviewError> for Notice {
    fn from(err: &ReviewError) -> Self {
        let level = if err.is_benign() {
            NoticeLevel::Info
        } else {
            NoticeLevel::Error
        };
        Self {
            level,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Info => write!(f, "note: {}", self.message),
            NoticeLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}

pub struct ReviewSession {
    api: Arc<dyn ReviewApi>,
    store: Arc<UpdateStore>,
    poller: Arc<Poller>,
    dispatcher: ReviewDispatcher,
    notices: Mutex<VecDeque<Notice>>,
    tick_errors: tokio::sync::Mutex<mpsc::UnboundedReceiver<ReviewError>>,
}

impl ReviewSession {
    pub fn new(api: Arc<dyn ReviewApi>, poll_interval: Duration) -> Self {
        let store = Arc::new(UpdateStore::new());
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let poller = Arc::new(Poller::with_error_sink(
            Arc::clone(&api),
            Arc::clone(&store),
            poll_interval,
            errors_tx,
        ));
        let dispatcher =
            ReviewDispatcher::new(Arc::clone(&api), Arc::clone(&store), Arc::clone(&poller));
        Self {
            api,
            store,
            poller,
            dispatcher,
            notices: Mutex::new(VecDeque::new()),
            tick_errors: tokio::sync::Mutex::new(errors_rx),
        }
    }

    /// Begin polling. Must be called within a Tokio runtime.
    pub fn start(&self) {
        self.poller.start();
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn store(&self) -> &UpdateStore {
        &self.store
    }

    pub fn counter(&self) -> NotificationCounter {
        NotificationCounter::new(&self.store)
    }

    // ── Review workflow ──

    pub async fn refresh(&self) -> Result<RefreshOutcome, ReviewError> {
        let result = self.poller.refresh().await;
        self.noted(result)
    }

    /// Select `id`. An id that is not pending leaves the selection as it was
    /// and returns `false`.
    pub fn select(&self, id: &UpdateId) -> bool {
        let selected = self.store.select(id);
        if selected {
            debug!(%id, "selected");
        } else {
            debug!(%id, "ignoring selection of update that is not pending");
        }
        selected
    }

    pub async fn accept(&self) -> Result<ResolveOutcome, ReviewError> {
        self.resolve_selected(Decision::Accept).await
    }

    pub async fn reject(&self) -> Result<ResolveOutcome, ReviewError> {
        self.resolve_selected(Decision::Reject).await
    }

    pub async fn resolve_selected(&self, decision: Decision) -> Result<ResolveOutcome, ReviewError> {
        let result = self.dispatcher.resolve_selected(decision).await;
        self.noted(result)
    }

    pub async fn resolve(
        &self,
        id: &UpdateId,
        decision: Decision,
    ) -> Result<ResolveOutcome, ReviewError> {
        let result = self.dispatcher.resolve(id, decision).await;
        self.noted(result)
    }

    /// Fetch the server's current view of `id`.
    pub async fn update_detail(&self, id: &UpdateId) -> Result<Update, ReviewError> {
        let result = self.api.get_update(id).await.map_err(|err| {
            if err.is_not_found() {
                ReviewError::NotFound(id.clone())
            } else {
                ReviewError::FetchFailed(err)
            }
        });
        self.noted(result)
    }

    /// Ask the server to crawl `input`. Blank or non-http(s) input is
    /// rejected without a request.
    pub async fn trigger_crawl(&self, input: &str) -> Result<CrawlSummary, ReviewError> {
        let url = match validate_crawl_url(input) {
            Ok(url) => url,
            Err(err) => return self.noted(Err(err.into())),
        };
        info!(%url, "triggering crawl");
        let result = self.api.trigger_crawl(&url).await;
        if let Ok(summary) = &result {
            info!(
                downloaded = summary.downloaded_files.len(),
                changes = summary.detected_changes().count(),
                "crawl finished"
            );
        }
        self.noted(result.map_err(ReviewError::CrawlFailed))
    }

    // ── Reference data ──

    pub async fn fetch_evidence(&self, locator: &str) -> Result<Vec<u8>, ReviewError> {
        let result = self.api.fetch_evidence(locator).await;
        self.noted(result.map_err(ReviewError::FetchFailed))
    }

    pub async fn audit_logs(&self) -> Result<Vec<AuditEntry>, ReviewError> {
        let result = self.api.list_audit_logs().await;
        self.noted(result.map_err(ReviewError::FetchFailed))
    }

    pub async fn tax_schemes(&self) -> Result<Vec<TaxScheme>, ReviewError> {
        let result = self.api.list_tax_schemes().await;
        self.noted(result.map_err(ReviewError::FetchFailed))
    }

    // ── Notices ──

    /// Notices not yet dismissed, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.drain_tick_errors();
        self.lock_notices().iter().cloned().collect()
    }

    /// Remove and return the oldest notice.
    pub fn dismiss(&self) -> Option<Notice> {
        self.drain_tick_errors();
        self.lock_notices().pop_front()
    }

    /// Wait for the next background poll failure and queue it as a notice.
    /// Returns `None` once the poller is gone.
    pub async fn next_notice(&self) -> Option<Notice> {
        let err = self.tick_errors.lock().await.recv().await?;
        let notice = Notice::from(&err);
        self.lock_notices().push_back(notice.clone());
        Some(notice)
    }

    fn drain_tick_errors(&self) {
        let Ok(mut rx) = self.tick_errors.try_lock() else {
            // `next_notice` is waiting and will queue the error itself.
            return;
        };
        let mut notices = self.lock_notices();
        while let Ok(err) = rx.try_recv() {
            notices.push_back(Notice::from(&err));
        }
    }

    fn noted<T>(&self, result: Result<T, ReviewError>) -> Result<T, ReviewError> {
        if let Err(err) = &result {
            self.lock_notices().push_back(Notice::from(err));
        }
        result
    }

    fn lock_notices(&self) -> MutexGuard<'_, VecDeque<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ReviewSession {
    fn drop(&mut self) {
        self.poller.stop();
    }
}
