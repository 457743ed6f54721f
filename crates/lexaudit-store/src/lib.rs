//! Review session state: pending updates, the selected update, and the
//! notification count derived from them.

mod counter;
mod error;
pub mod selection;
mod store;

pub use counter::{NotificationCounter, badge_label};
pub use error::StoreError;
pub use store::{Snapshot, UpdateStore};

#[cfg(test)]
pub(crate) mod test_support {
    use lexaudit_core::{Update, UpdateId};

    use crate::Snapshot;

    pub fn update(id: &str) -> Update {
        Update {
            id: UpdateId::new(id),
            detected_item: format!("item {id}"),
            current_db_val: 18.0,
            new_web_val: 20.0,
            evidence_quote: "revised to 20 per cent".into(),
            evidence_pdf_path: format!("evidence/highlighted/{id}_highlighted.pdf"),
            status: None,
            created_at: "2026-02-21T10:00:00".into(),
        }
    }

    pub fn ids(snap: &Snapshot) -> Vec<String> {
        snap.updates.iter().map(|u| u.id.to_string()).collect()
    }
}
