//! Server sync for the review workflow: the `ReviewApi` seam with its HTTP
//! implementation, the poller that keeps the store fresh, and the dispatcher
//! that resolves updates.

mod api;
mod error;

pub mod dispatch;
#[cfg(feature = "http")]
pub mod http;
pub mod poller;
pub mod session;

#[cfg(test)]
mod test_support;

pub use api::{ApiError, ReviewApi};
pub use dispatch::{ResolveOutcome, ReviewDispatcher, SkipReason};
pub use error::ReviewError;
pub use poller::{Poller, RefreshOutcome};
pub use session::{Notice, NoticeLevel, ReviewSession};

#[cfg(feature = "http")]
pub use http::{Health, ReviewClient};
