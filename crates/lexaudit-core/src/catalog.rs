//! Read-only server collections: the tax-scheme catalog and the audit log.

use serde::{Deserialize, Serialize};

/// A catalog entry holding the currently applied rate for one tax item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxScheme {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub item_name: String,
    pub tax_percentage: f64,
    /// ISO 8601 timestamp string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// One accept/reject decision recorded by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    /// `update_accepted` or `update_rejected`.
    pub action: String,
    pub item_name: String,
    /// Absent when the accepted item had no prior catalog entry.
    pub old_value: Option<f64>,
    pub new_value: f64,
    /// ISO 8601 timestamp string.
    pub timestamp: String,
}

impl AuditEntry {
    pub fn is_acceptance(&self) -> bool {
        self.action == "update_accepted"
    }
}
