use lexaudit_core::{CrawlUrlError, Decision, UpdateId};
use thiserror::Error;

use crate::ApiError;

/// Failures surfaced by the review workflow. None of them is fatal: the
/// session stays usable and the next poll reconciles with the server.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// A list or detail fetch failed; the next poll tick retries it.
    #[error("failed to fetch from server: {0}")]
    FetchFailed(#[source] ApiError),

    /// Accept/reject failed; the update stays pending and selected.
    #[error("failed to {decision} update {id}: {source}")]
    MutationFailed {
        id: UpdateId,
        decision: Decision,
        source: ApiError,
    },

    /// The target is gone on the server.
    #[error("update {0} was already resolved")]
    NotFound(UpdateId),

    /// Input rejected locally; nothing was sent.
    #[error("invalid input: {0}")]
    ValidationFailed(String),

    #[error("crawl failed: {0}")]
    CrawlFailed(#[source] ApiError),
}

impl From<CrawlUrlError> for ReviewError {
    fn from(err: CrawlUrlError) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}

impl ReviewError {
    /// Whether the failure only reflects work already done elsewhere.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
