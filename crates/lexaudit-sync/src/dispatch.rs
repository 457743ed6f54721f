//! Accept/reject dispatch for pending updates.
//!
//! An update leaves the store only after the server confirms the resolution
//! (or reports it already gone); a failed request leaves it pending and
//! selectable. Every completed resolution is followed by a poller refresh so
//! the store converges on server truth.

use std::sync::Arc;

use lexaudit_core::{Decision, ResolveResponse, UpdateId};
use lexaudit_store::UpdateStore;
use tracing::{debug, info, warn};

use crate::{Poller, ReviewApi, ReviewError};

/// Result of a resolve request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The server applied the decision.
    Resolved {
        id: UpdateId,
        decision: Decision,
        response: ResolveResponse,
    },
    /// The server no longer had the update pending.
    AlreadyResolved { id: UpdateId },
    /// Nothing was sent.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoSelection,
    /// Another accept/reject is still in flight.
    Busy,
    /// The id is not pending in this session (resolved meanwhile).
    NotPending(UpdateId),
}

pub struct ReviewDispatcher {
    api: Arc<dyn ReviewApi>,
    store: Arc<UpdateStore>,
    poller: Arc<Poller>,
}

impl ReviewDispatcher {
    pub fn new(api: Arc<dyn ReviewApi>, store: Arc<UpdateStore>, poller: Arc<Poller>) -> Self {
        Self { api, store, poller }
    }

    /// Resolve the currently selected update.
    pub async fn resolve_selected(&self, decision: Decision) -> Result<ResolveOutcome, ReviewError> {
        match self.store.selected() {
            Some(id) => self.resolve(&id, decision).await,
            None => Ok(ResolveOutcome::Skipped(SkipReason::NoSelection)),
        }
    }

    /// Resolve `id` with `decision`.
    ///
    /// An id that is not pending, or a request while another is in flight,
    /// is skipped without contacting the server.
    pub async fn resolve(
        &self,
        id: &UpdateId,
        decision: Decision,
    ) -> Result<ResolveOutcome, ReviewError> {
        if self.store.get(id).is_err() {
            debug!(%id, "update not pending, skipping {decision}");
            return Ok(ResolveOutcome::Skipped(SkipReason::NotPending(id.clone())));
        }
        if !self.store.try_begin_processing() {
            debug!(%id, "resolution already in flight, skipping {decision}");
            return Ok(ResolveOutcome::Skipped(SkipReason::Busy));
        }
        let _slot = ProcessingSlot(&self.store);

        let outcome = match self.api.resolve(id, decision).await {
            Ok(response) => {
                info!(%id, %decision, status = %response.status, "update resolved");
                self.store.remove(id);
                ResolveOutcome::Resolved {
                    id: id.clone(),
                    decision,
                    response,
                }
            }
            Err(err) if err.is_not_found() => {
                info!(%id, %decision, "update already resolved on server");
                self.store.remove(id);
                ResolveOutcome::AlreadyResolved { id: id.clone() }
            }
            Err(source) => {
                warn!(%id, %decision, error = %source, "resolution failed");
                return Err(ReviewError::MutationFailed {
                    id: id.clone(),
                    decision,
                    source,
                });
            }
        };

        // The local removal is provisional; reconcile with the server.
        if let Err(err) = self.poller.refresh().await {
            warn!(error = %err, "refresh after resolution failed");
        }
        Ok(outcome)
    }
}

/// Releases the store's processing flag on every exit path.
struct ProcessingSlot<'a>(&'a UpdateStore);

impl Drop for ProcessingSlot<'_> {
    fn drop(&mut self) {
        self.0.finish_processing();
    }
}
