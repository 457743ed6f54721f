//! Scripted in-memory server for poller, dispatcher, and session tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lexaudit_core::{
    AuditEntry, CrawlSummary, Decision, ResolveResponse, TaxScheme, Update, UpdateId,
};
use tokio::sync::{oneshot, watch};
use url::Url;

use crate::{ApiError, ReviewApi};

pub fn update(id: &str) -> Update {
    rated(id, 18.0, 20.0)
}

pub fn rated(id: &str, current: f64, new: f64) -> Update {
    Update {
        id: UpdateId::new(id),
        detected_item: format!("item {id}"),
        current_db_val: current,
        new_web_val: new,
        evidence_quote: "revised rate".into(),
        evidence_pdf_path: format!("evidence/highlighted/{id}_highlighted.pdf"),
        status: None,
        created_at: "2026-02-21T10:00:00".into(),
    }
}

/// Responses are consumed in order; an empty list queue answers `Ok(vec![])`
/// and an empty resolve queue confirms the resolution.
pub struct FakeApi {
    lists: Mutex<VecDeque<Result<Vec<Update>, ApiError>>>,
    list_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    resolves: Mutex<VecDeque<Result<ResolveResponse, ApiError>>>,
    resolve_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    resolved: Mutex<Vec<(UpdateId, Decision)>>,
    crawls: AtomicUsize,
    list_calls: AtomicUsize,
    list_calls_tx: watch::Sender<usize>,
    active_lists: AtomicUsize,
    max_active_lists: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            lists: Mutex::default(),
            list_gates: Mutex::default(),
            resolves: Mutex::default(),
            resolve_gates: Mutex::default(),
            resolved: Mutex::default(),
            crawls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            list_calls_tx: watch::Sender::new(0),
            active_lists: AtomicUsize::new(0),
            max_active_lists: AtomicUsize::new(0),
        }
    }

    pub fn push_list(&self, response: Result<Vec<Update>, ApiError>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub fn push_resolve(&self, response: Result<ResolveResponse, ApiError>) {
        self.resolves.lock().unwrap().push_back(response);
    }

    /// Hold the next list call open until the returned sender fires.
    pub fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Hold the next resolve call open until the returned sender fires.
    pub fn gate_next_resolve(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.resolve_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_lists(&self) -> usize {
        self.max_active_lists.load(Ordering::SeqCst)
    }

    pub fn resolved(&self) -> Vec<(UpdateId, Decision)> {
        self.resolved.lock().unwrap().clone()
    }

    pub fn crawl_calls(&self) -> usize {
        self.crawls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_list_calls(&self, n: usize) {
        let mut rx = self.list_calls_tx.subscribe();
        rx.wait_for(|calls| *calls >= n).await.unwrap();
    }
}

pub fn confirmed(status: &str) -> Result<ResolveResponse, ApiError> {
    Ok(ResolveResponse {
        status: status.into(),
        message: String::new(),
    })
}

#[async_trait]
impl ReviewApi for FakeApi {
    async fn list_pending(&self) -> Result<Vec<Update>, ApiError> {
        let calls = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.active_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_lists.fetch_max(active, Ordering::SeqCst);
        self.list_calls_tx.send_replace(calls);

        let gate = self.list_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.active_lists.fetch_sub(1, Ordering::SeqCst);
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_update(&self, id: &UpdateId) -> Result<Update, ApiError> {
        Err(ApiError::NotFound(format!("/updates/{id}")))
    }

    async fn resolve(
        &self,
        id: &UpdateId,
        decision: Decision,
    ) -> Result<ResolveResponse, ApiError> {
        self.resolved.lock().unwrap().push((id.clone(), decision));

        let gate = self.resolve_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.resolves
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| confirmed(if decision.accepts() { "accepted" } else { "rejected" }))
    }

    async fn trigger_crawl(&self, _url: &Url) -> Result<CrawlSummary, ApiError> {
        self.crawls.fetch_add(1, Ordering::SeqCst);
        Ok(CrawlSummary {
            status: "completed".into(),
            downloaded_files: vec!["evidence/raw/notice.pdf".into()],
            analysis_results: Vec::new(),
        })
    }

    async fn fetch_evidence(&self, locator: &str) -> Result<Vec<u8>, ApiError> {
        Err(ApiError::NotFound(locator.to_string()))
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditEntry>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_tax_schemes(&self) -> Result<Vec<TaxScheme>, ApiError> {
        Ok(Vec::new())
    }
}
