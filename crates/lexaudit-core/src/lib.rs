pub mod catalog;
pub mod config;
pub mod crawl;
pub mod update;

pub use catalog::{AuditEntry, TaxScheme};
pub use config::{ClientConfig, ConfigError};
pub use crawl::{AnalysisResult, CrawlSummary, CrawlUrlError, validate_crawl_url};
pub use update::{Decision, ResolveRequest, ResolveResponse, Update, UpdateId, UpdateStatus};
