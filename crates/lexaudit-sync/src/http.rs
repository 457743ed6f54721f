//! HTTP client for the LexAudit review server.

use std::time::Duration;

use async_trait::async_trait;
use lexaudit_core::{
    AuditEntry, ClientConfig, CrawlSummary, Decision, ResolveRequest, ResolveResponse,
    TaxScheme, Update, UpdateId,
};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::{ApiError, ReviewApi};

/// Response of the `GET /` health check.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// HTTP client for the review server's update, crawl, and evidence endpoints.
pub struct ReviewClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReviewClient {
    /// Create a new client for the given server base URL.
    ///
    /// `base_url` should be like `http://localhost:8000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client with the base URL and request timeout from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, config.api.base_url.clone()))
    }

    fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the server serves the evidence document for `locator` from.
    ///
    /// Evidence is served by file name, so only the last path segment of the
    /// locator is kept.
    pub fn evidence_url(&self, locator: &str) -> String {
        let file_name = locator
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(locator);
        format!("{}/evidence/{}", self.base_url, file_name)
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get_json("/").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp, path).await?;
        Ok(resp.json().await?)
    }
}

/// Map 404 to [`ApiError::NotFound`] and other failures to [`ApiError::Server`].
async fn check_status(resp: Response, what: &str) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[async_trait]
impl ReviewApi for ReviewClient {
    async fn list_pending(&self) -> Result<Vec<Update>, ApiError> {
        let updates: Vec<Update> = self.get_json("/updates").await?;
        debug!(count = updates.len(), "pulled pending updates");
        Ok(updates)
    }

    async fn get_update(&self, id: &UpdateId) -> Result<Update, ApiError> {
        self.get_json(&format!("/updates/{id}")).await
    }

    async fn resolve(
        &self,
        id: &UpdateId,
        decision: Decision,
    ) -> Result<ResolveResponse, ApiError> {
        let path = format!("/updates/{id}/accept");
        let url = format!("{}{}", self.base_url, path);

        info!(url = %url, %decision, "resolving update");
        let resp = self
            .client
            .post(&url)
            .json(&ResolveRequest::from(decision))
            .send()
            .await?;
        let resp = check_status(resp, &path).await?;

        let result: ResolveResponse = resp.json().await?;
        debug!(%id, status = %result.status, "resolve response");
        Ok(result)
    }

    async fn trigger_crawl(&self, target: &Url) -> Result<CrawlSummary, ApiError> {
        let url = format!("{}/crawl", self.base_url);

        info!(target = %target, "triggering crawl");
        let resp = self
            .client
            .post(&url)
            .query(&[("url", target.as_str())])
            .send()
            .await?;
        let resp = check_status(resp, "/crawl").await?;

        let summary: CrawlSummary = resp.json().await?;
        info!(
            downloaded = summary.downloaded_files.len(),
            changes = summary.detected_changes().count(),
            "crawl complete"
        );
        Ok(summary)
    }

    async fn fetch_evidence(&self, locator: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.evidence_url(locator);
        debug!(url = %url, "fetching evidence");
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp, locator).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditEntry>, ApiError> {
        self.get_json("/audit-logs").await
    }

    async fn list_tax_schemes(&self) -> Result<Vec<TaxScheme>, ApiError> {
        self.get_json("/tax-schemes").await
    }
}
