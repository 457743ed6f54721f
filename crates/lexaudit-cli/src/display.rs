//! Terminal rendering for pending updates, crawl results, and reference data.
//!
//! Single updates render as a vertical card grouped into sections; lists
//! render as one aligned row per record.

use chrono::{DateTime, NaiveDateTime};
use lexaudit_core::{AuditEntry, CrawlSummary, TaxScheme, Update, UpdateId};

const MAX_LIST_ITEMS: usize = 20;
const MAX_ITEM_CHARS: usize = 32;
const MAX_QUOTE_CHARS: usize = 400;

// ── Update card ──

/// Print one update as a vertical card.
pub fn print_update_card(update: &Update) {
    println!("=== Update {} ===", update.id);
    println!("{}", update.detected_item);
    println!();

    println!("Rate change");
    print_field("current", format!("{:.1}%", update.current_db_val));
    print_field("detected", format!("{:.1}%", update.new_web_val));
    print_field("delta", update.delta_label());
    if let Some(status) = update.status {
        print_field("status", format!("{status:?}").to_lowercase());
    }
    println!();

    println!("Evidence");
    if !update.evidence_quote.is_empty() {
        print_field("quote", truncate(&update.evidence_quote, MAX_QUOTE_CHARS));
    }
    print_field("document", &update.evidence_pdf_path);
    println!();

    println!("Timestamps");
    print_field("detected_at", format_timestamp(&update.created_at));
    println!();
}

fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {label:<14} {value}");
}

// ── Lists ──

/// Print pending updates, marking the selected one with `*`.
pub fn print_update_list(updates: &[Update], selected: Option<&UpdateId>) {
    if updates.is_empty() {
        println!("No pending updates.");
        return;
    }
    for update in updates {
        let is_selected = selected == Some(&update.id);
        println!("{}", update_row(update, is_selected));
    }
}

fn update_row(update: &Update, selected: bool) -> String {
    let marker = if selected { '*' } else { ' ' };
    let date = update
        .created_on()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{marker} {:<6} {:<width$} {:>6.1}% -> {:>6.1}%  {:>7}  {date}",
        update.id.as_str(),
        truncate(&update.detected_item, MAX_ITEM_CHARS),
        update.current_db_val,
        update.new_web_val,
        update.delta_label(),
        width = MAX_ITEM_CHARS,
    )
}

pub fn print_crawl_summary(summary: &CrawlSummary) {
    println!(
        "Crawl {}: {} document(s) downloaded",
        summary.status,
        summary.downloaded_files.len()
    );
    let changes: Vec<_> = summary.detected_changes().collect();
    if changes.is_empty() {
        println!("No rate changes detected.");
        return;
    }
    println!("Detected changes:");
    for change in changes {
        let item = change.item.as_deref().unwrap_or("(unknown item)");
        match change.new_val {
            Some(val) => println!("  {item:<MAX_ITEM_CHARS$} {val:.1}%  [{}]", change.pdf),
            None => println!("  {item:<MAX_ITEM_CHARS$} -  [{}]", change.pdf),
        }
    }
}

/// Print audit entries as returned (newest first).
pub fn print_audit_log(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    let show = entries.len().min(MAX_LIST_ITEMS);
    for entry in &entries[..show] {
        let old = entry
            .old_value
            .map(|v| format!("{v:.1}%"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:<10} {:<width$} {old:>7} -> {:.1}%",
            format_timestamp(&entry.timestamp),
            entry.action,
            truncate(&entry.item_name, MAX_ITEM_CHARS),
            entry.new_value,
            width = MAX_ITEM_CHARS,
        );
    }
    if entries.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", entries.len() - MAX_LIST_ITEMS);
    }
}

pub fn print_schemes(schemes: &[TaxScheme]) {
    if schemes.is_empty() {
        println!("No tax schemes.");
        return;
    }
    for scheme in schemes {
        let updated = scheme
            .last_updated
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default();
        println!(
            "{:<width$} {:>6.1}%  {updated}",
            truncate(&scheme.item_name, MAX_ITEM_CHARS),
            scheme.tax_percentage,
            width = MAX_ITEM_CHARS,
        );
    }
}

// ── Formatting helpers ──

/// Render a server timestamp as `YYYY-MM-DD HH:MM`, or verbatim if unparseable.
fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
