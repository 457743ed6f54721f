//! Pending-update records shared between the review client and the LexAudit server.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of a pending update.
///
/// The server currently issues hex object ids, but older fixtures and
/// exports use plain integers, so both decode into the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UpdateId(String);

impl UpdateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UpdateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UpdateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for UpdateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// Server-side lifecycle status of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A candidate tax-rate change detected by the crawler, awaiting review.
///
/// Records are immutable on the client: a poll replaces them wholesale and a
/// resolution removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: UpdateId,
    /// Label of the tax parameter that changed, e.g. "GST on textiles".
    pub detected_item: String,
    /// Rate currently recorded in the catalog, in percent.
    pub current_db_val: f64,
    /// Rate found in the crawled document, in percent.
    pub new_web_val: f64,
    /// Verbatim excerpt from the evidence document.
    pub evidence_quote: String,
    /// Server-side locator of the (possibly highlighted) evidence PDF.
    pub evidence_pdf_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UpdateStatus>,
    /// ISO 8601 timestamp string, display-only.
    pub created_at: String,
}

impl Update {
    /// Proposed change in percentage points.
    pub fn delta(&self) -> f64 {
        self.new_web_val - self.current_db_val
    }

    /// Signed delta with one decimal place, e.g. `+2.0%`.
    pub fn delta_label(&self) -> String {
        format!("{:+.1}%", self.delta())
    }

    /// Calendar date of `created_at`, if it parses.
    ///
    /// The server emits naive ISO timestamps (no offset); RFC 3339 is
    /// accepted as well.
    pub fn created_on(&self) -> Option<NaiveDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(dt.date_naive());
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|dt| dt.date())
    }
}

/// Reviewer verdict on an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Value of the `accept` flag sent to the server.
    pub fn accepts(self) -> bool {
        matches!(self, Self::Accept)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /updates/{id}/accept`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub accept: bool,
}

impl From<Decision> for ResolveRequest {
    fn from(decision: Decision) -> Self {
        Self {
            accept: decision.accepts(),
        }
    }
}

/// Server confirmation of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}
