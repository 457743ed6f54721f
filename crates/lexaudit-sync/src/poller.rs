//! Periodic refresh of the pending-update list.
//!
//! At most one list fetch runs at a time: a trigger that arrives while a fetch
//! is in flight marks a rerun, and the in-flight fetch runs once more after it
//! completes. Stopping the poller bumps an epoch; a response from an older
//! epoch is dropped instead of being applied, and a fetch that outlives a
//! stop still blocks new fetches until it returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lexaudit_store::UpdateStore;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{ReviewApi, ReviewError};

/// What a refresh trigger ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The store now holds the fetched list.
    Applied { count: usize },
    /// A fetch was already in flight; it will run once more when done.
    Coalesced,
    /// The response arrived after the poller was stopped.
    Discarded,
    /// The poller is not running; nothing was fetched.
    Stopped,
}

#[derive(Debug, Default)]
struct PollState {
    running: bool,
    in_flight: bool,
    rerun: bool,
    epoch: u64,
}

struct PollerInner {
    api: Arc<dyn ReviewApi>,
    store: Arc<UpdateStore>,
    interval: Duration,
    state: Mutex<PollState>,
    errors: Option<mpsc::UnboundedSender<ReviewError>>,
}

struct PollTask {
    shutdown: watch::Sender<bool>,
    _handle: JoinHandle<()>,
}

/// Scheduled refresh of the store from [`ReviewApi::list_pending`].
pub struct Poller {
    inner: Arc<PollerInner>,
    task: Mutex<Option<PollTask>>,
}

impl Poller {
    pub fn new(api: Arc<dyn ReviewApi>, store: Arc<UpdateStore>, interval: Duration) -> Self {
        Self::build(api, store, interval, None)
    }

    /// Like [`new`](Self::new), but failures of scheduled ticks are also sent
    /// to `errors` so a presentation layer can show them.
    pub fn with_error_sink(
        api: Arc<dyn ReviewApi>,
        store: Arc<UpdateStore>,
        interval: Duration,
        errors: mpsc::UnboundedSender<ReviewError>,
    ) -> Self {
        Self::build(api, store, interval, Some(errors))
    }

    fn build(
        api: Arc<dyn ReviewApi>,
        store: Arc<UpdateStore>,
        interval: Duration,
        errors: Option<mpsc::UnboundedSender<ReviewError>>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                api,
                store,
                interval,
                state: Mutex::new(PollState::default()),
                errors,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Start polling: one fetch immediately, then one per interval.
    ///
    /// Must be called within a Tokio runtime. Calling it while running is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }
        self.inner.lock().running = true;

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => inner.tick().await,
                }
            }
            debug!("poll loop exited");
        });

        info!(interval_secs = self.inner.interval.as_secs(), "poller started");
        *task = Some(PollTask {
            shutdown,
            _handle: handle,
        });
    }

    /// Stop polling. No store mutation from a fetch happens after this returns;
    /// a fetch still in flight completes but its result is dropped. Until it
    /// completes it still counts as in flight, so a restart does not overlap it.
    pub fn stop(&self) {
        {
            let mut state = self.inner.lock();
            if !state.running {
                return;
            }
            state.running = false;
            state.epoch += 1;
            state.rerun = false;
            self.inner.store.set_loading(false);
        }
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = task.shutdown.send(true);
        }
        info!("poller stopped");
    }

    /// Trigger one refresh now, as a manual "refresh" or a post-mutation
    /// reconciliation.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ReviewError> {
        self.inner.refresh().await
    }

    /// Accept refresh triggers without spawning the tick loop.
    #[cfg(test)]
    pub(crate) fn mark_running(&self) {
        self.inner.lock().running = true;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollerInner {
    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn tick(&self) {
        // Errors are already logged by `refresh`.
        if let Err(err) = self.refresh().await {
            if let Some(errors) = &self.errors {
                let _ = errors.send(err);
            }
        }
    }

    async fn refresh(&self) -> Result<RefreshOutcome, ReviewError> {
        let mut epoch = {
            let mut state = self.lock();
            if !state.running {
                return Ok(RefreshOutcome::Stopped);
            }
            if state.in_flight {
                debug!("fetch in flight, coalescing trigger");
                state.rerun = true;
                return Ok(RefreshOutcome::Coalesced);
            }
            state.in_flight = true;
            self.store.set_loading(true);
            state.epoch
        };
        let _in_flight = InFlight { inner: self };

        loop {
            let result = self.api.list_pending().await;

            let mut state = self.lock();
            if !state.running {
                debug!(epoch, "discarding list response after stop");
                return Ok(RefreshOutcome::Discarded);
            }
            if state.epoch != epoch {
                // Restarted while this fetch was out; fetch again for the new run.
                debug!(epoch, current = state.epoch, "discarding stale list response");
                epoch = state.epoch;
                state.rerun = false;
                self.store.set_loading(true);
                continue;
            }
            let updates = match result {
                Ok(updates) => updates,
                Err(err) => {
                    state.rerun = false;
                    warn!(error = %err, "failed to fetch pending updates");
                    return Err(ReviewError::FetchFailed(err));
                }
            };
            let count = updates.len();
            self.store.replace_all(updates);
            debug!(count, "store refreshed");

            if !std::mem::take(&mut state.rerun) {
                return Ok(RefreshOutcome::Applied { count });
            }
            debug!("running coalesced refresh");
        }
    }
}

/// Clears the in-flight flag when a fetch ends, including when the refresh
/// future is dropped mid-request.
struct InFlight<'a> {
    inner: &'a PollerInner,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.in_flight = false;
        // No-op when `stop` already cleared it.
        self.inner.store.set_loading(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeApi, update};
    use lexaudit_core::UpdateId;

    fn poller(api: &Arc<FakeApi>, store: &Arc<UpdateStore>) -> Poller {
        Poller::new(api.clone(), store.clone(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn refresh_while_stopped_does_nothing() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(UpdateStore::new());
        let poller = poller(&api, &store);

        assert_eq!(poller.refresh().await.unwrap(), RefreshOutcome::Stopped);
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_on_start_and_every_interval() {
        let api = Arc::new(FakeApi::new());
        api.push_list(Ok(vec![update("a")]));
        api.push_list(Ok(vec![update("a"), update("b")]));
        let store = Arc::new(UpdateStore::new());
        let poller = poller(&api, &store);

        poller.start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(api.list_calls(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.selected(), Some(UpdateId::new("a")));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.list_calls(), 2);
        assert_eq!(store.len(), 2);

        poller.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn failure_leaves_store_untouched() {
        let api = Arc::new(FakeApi::new());
        api.push_list(Ok(vec![update("a"), update("b")]));
        api.push_list(Err(crate::ApiError::Server {
            status: 500,
            body: "Failed to fetch pending updates".into(),
        }));
        let store = Arc::new(UpdateStore::new());
        let poller = poller(&api, &store);
        poller.inner.lock().running = true;

        poller.refresh().await.unwrap();
        store.select(&UpdateId::new("b"));

        let err = poller.refresh().await.unwrap_err();
        assert!(matches!(err, ReviewError::FetchFailed(_)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.selected(), Some(UpdateId::new("b")));
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn overlapping_triggers_issue_one_fetch_at_a_time() {
        let api = Arc::new(FakeApi::new());
        let gate = api.gate_next_list();
        api.push_list(Ok(vec![update("a")]));
        api.push_list(Ok(vec![update("a"), update("b")]));
        let store = Arc::new(UpdateStore::new());
        let poller = Arc::new(poller(&api, &store));
        poller.inner.lock().running = true;

        let first = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh().await }
        });
        api.wait_for_list_calls(1).await;
        assert!(store.snapshot().loading);

        assert_eq!(poller.refresh().await.unwrap(), RefreshOutcome::Coalesced);
        assert_eq!(poller.refresh().await.unwrap(), RefreshOutcome::Coalesced);
        assert_eq!(api.list_calls(), 1);

        gate.send(()).unwrap();
        let outcome = first.await.unwrap().unwrap();

        // Both coalesced triggers fold into a single rerun.
        assert_eq!(outcome, RefreshOutcome::Applied { count: 2 });
        assert_eq!(api.list_calls(), 2);
        assert_eq!(api.max_concurrent_lists(), 1);
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn response_after_stop_is_discarded() {
        let api = Arc::new(FakeApi::new());
        let gate = api.gate_next_list();
        api.push_list(Ok(vec![update("late")]));
        let store = Arc::new(UpdateStore::new());
        let poller = Arc::new(poller(&api, &store));
        poller.inner.lock().running = true;

        let pending = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh().await }
        });
        api.wait_for_list_calls(1).await;

        poller.stop();
        let version = store.snapshot().version;
        gate.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), RefreshOutcome::Discarded);
        assert!(store.is_empty());
        assert!(!store.snapshot().loading);
        assert_eq!(store.snapshot().version, version);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_for_fetch_left_over_from_stop() {
        let api = Arc::new(FakeApi::new());
        let gate = api.gate_next_list();
        api.push_list(Ok(vec![update("stale")]));
        api.push_list(Ok(vec![update("a"), update("b")]));
        let store = Arc::new(UpdateStore::new());
        let poller = poller(&api, &store);

        poller.start();
        api.wait_for_list_calls(1).await;
        poller.stop();
        poller.start();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        // The restart's first tick coalesces into the outstanding fetch.
        assert_eq!(api.list_calls(), 1);

        gate.send(()).unwrap();
        let mut rx = store.subscribe();
        rx.wait_for(|snap| snap.len() == 2).await.unwrap();

        assert_eq!(api.list_calls(), 2);
        assert_eq!(api.max_concurrent_lists(), 1);
        assert!(!store.snapshot().contains(&UpdateId::new("stale")));
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn tick_failures_reach_error_sink() {
        let api = Arc::new(FakeApi::new());
        api.push_list(Err(crate::ApiError::Other("connection refused".into())));
        let store = Arc::new(UpdateStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = Poller::with_error_sink(api.clone(), store.clone(), Duration::from_secs(30), tx);

        poller.start();
        let err = rx.recv().await.unwrap();
        assert!(matches!(err, ReviewError::FetchFailed(_)));
        poller.stop();
    }
}
