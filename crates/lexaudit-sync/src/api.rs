//! Server operations consumed by the review workflow, independent of transport.

use async_trait::async_trait;
use lexaudit_core::{
    AuditEntry, CrawlSummary, Decision, ResolveResponse, TaxScheme, Update, UpdateId,
};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// The LexAudit server as seen by the review workflow.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// All pending updates, in server order.
    async fn list_pending(&self) -> Result<Vec<Update>, ApiError>;

    async fn get_update(&self, id: &UpdateId) -> Result<Update, ApiError>;

    /// Accept or reject `id`. An already-resolved id yields [`ApiError::NotFound`].
    async fn resolve(&self, id: &UpdateId, decision: Decision)
    -> Result<ResolveResponse, ApiError>;

    async fn trigger_crawl(&self, url: &Url) -> Result<CrawlSummary, ApiError>;

    /// Raw bytes of the evidence document behind `locator`.
    async fn fetch_evidence(&self, locator: &str) -> Result<Vec<u8>, ApiError>;

    /// Audit entries, newest first.
    async fn list_audit_logs(&self) -> Result<Vec<AuditEntry>, ApiError>;

    async fn list_tax_schemes(&self) -> Result<Vec<TaxScheme>, ApiError>;
}
