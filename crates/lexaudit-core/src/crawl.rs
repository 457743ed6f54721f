//! Manual crawl requests and the summary the server returns for them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrawlUrlError {
    #[error("a URL is required")]
    Empty,
    #[error("invalid URL {input:?}: {reason}")]
    Invalid { input: String, reason: String },
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
}

/// Validate reviewer input before a crawl is dispatched.
///
/// Surrounding whitespace is ignored; blank input never reaches the server.
pub fn validate_crawl_url(input: &str) -> Result<Url, CrawlUrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CrawlUrlError::Empty);
    }
    let url = Url::parse(trimmed).map_err(|e| CrawlUrlError::Invalid {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CrawlUrlError::UnsupportedScheme(other.to_string())),
    }
}

/// Per-document analysis produced during a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub pdf: String,
    pub change_detected: bool,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub new_val: Option<f64>,
}

/// Response of `POST /crawl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    #[serde(default)]
    pub status: String,
    pub downloaded_files: Vec<String>,
    #[serde(default)]
    pub analysis_results: Vec<AnalysisResult>,
}

impl CrawlSummary {
    /// Analyses that flagged a rate change (each becomes a pending update).
    pub fn detected_changes(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.analysis_results.iter().filter(|r| r.change_detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(validate_crawl_url(""), Err(CrawlUrlError::Empty));
        assert_eq!(validate_crawl_url("  \t\n"), Err(CrawlUrlError::Empty));
    }

    #[test]
    fn input_is_trimmed() {
        let url = validate_crawl_url("  https://gst.example.gov/notifications  ").unwrap();
        assert_eq!(url.as_str(), "https://gst.example.gov/notifications");
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        assert_eq!(
            validate_crawl_url("ftp://example.com/a.pdf"),
            Err(CrawlUrlError::UnsupportedScheme("ftp".into()))
        );
        assert!(matches!(
            validate_crawl_url("not a url"),
            Err(CrawlUrlError::Invalid { .. })
        ));
    }

    #[test]
    fn summary_without_analysis_results() {
        let json = r#"{"downloaded_files": ["evidence/raw/a.pdf", "evidence/raw/b.pdf"]}"#;
        let summary: CrawlSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.downloaded_files.len(), 2);
        assert_eq!(summary.detected_changes().count(), 0);
    }

    #[test]
    fn detected_changes_filters_analyses() {
        let json = r#"{
            "status": "completed",
            "downloaded_files": ["a.pdf", "b.pdf"],
            "analysis_results": [
                {"pdf": "a.pdf", "change_detected": true, "item": "VAT", "new_val": 21.0},
                {"pdf": "b.pdf", "change_detected": false, "item": null, "new_val": null}
            ]
        }"#;
        let summary: CrawlSummary = serde_json::from_str(json).unwrap();
        let changes: Vec<_> = summary.detected_changes().collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].item.as_deref(), Some("VAT"));
    }
}
