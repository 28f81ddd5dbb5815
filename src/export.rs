//! Export utilities for built indices
//!
//! Provides the JSON export document and the plain-text listings used by the
//! CLI.

use crate::index::{IndexStats, Indexes, InvertedIndex, KeyIndex};
use crate::model::{Occurrence, Transaction};
use serde::Serialize;
use std::fmt::Write;

/// Counts included at the top of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub transactions: usize,
    pub skipped: usize,
    pub values: usize,
    pub keys: usize,
    pub occurrences: usize,
}

impl ExportStats {
    pub fn new(stats: IndexStats, transactions: usize, skipped: usize) -> Self {
        Self {
            transactions,
            skipped,
            values: stats.values,
            keys: stats.keys,
            occurrences: stats.occurrences,
        }
    }
}

/// JSON document holding both indices
#[derive(Debug, Serialize)]
pub struct IndexExport<'a> {
    pub generated_at: String,
    pub source: Option<String>,
    pub stats: ExportStats,
    pub inverted: &'a InvertedIndex,
    pub keys: &'a KeyIndex,
}

impl<'a> IndexExport<'a> {
    pub fn new(
        indexes: &'a Indexes,
        source: Option<String>,
        transactions: usize,
        skipped: usize,
    ) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            source,
            stats: ExportStats::new(indexes.stats(), transactions, skipped),
            inverted: indexes.inverted(),
            keys: indexes.keys(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Describe the transaction behind an occurrence, e.g. `GET https://host/path -> 200`
fn request_line(transactions: &[Transaction], occurrence: &Occurrence) -> String {
    // ids are sequential, so the id is normally the slice position
    let tx = transactions
        .get(occurrence.transaction_id as usize)
        .filter(|tx| tx.id == occurrence.transaction_id)
        .or_else(|| transactions.iter().find(|tx| tx.id == occurrence.transaction_id));

    match tx {
        Some(tx) => format!("{} {} -> {}", tx.method, tx.url, tx.status),
        None => "(unknown transaction)".to_string(),
    }
}

fn occurrence_line(
    out: &mut String,
    transactions: &[Transaction],
    occurrence: &Occurrence,
    value: Option<&str>,
) {
    write!(
        out,
        "  #{:<5} {:<16} {}",
        occurrence.transaction_id,
        occurrence.location.as_str(),
        occurrence.path
    )
    .unwrap();
    if let Some(value) = value {
        write!(out, " = {}", value).unwrap();
    }
    writeln!(out, "   [{}]", request_line(transactions, occurrence)).unwrap();
}

fn truncated(out: &mut String, total: usize, shown: usize) {
    if total > shown {
        writeln!(out, "  ... {} more", total - shown).unwrap();
    }
}

/// Listing for "where did this value come from?"
pub fn where_report(
    indexes: &Indexes,
    transactions: &[Transaction],
    value: &str,
    limit: Option<usize>,
) -> String {
    let mut out = String::new();
    let occurrences = indexes.occurrences(value);

    let Some(origin) = indexes.origin(value) else {
        writeln!(out, "Value {:?} not found", value).unwrap();
        return out;
    };

    writeln!(out, "Value {:?}: {} occurrence(s)", value, occurrences.len()).unwrap();
    writeln!(
        out,
        "Origin: #{} {} {}   [{}]",
        origin.transaction_id,
        origin.location,
        origin.path,
        request_line(transactions, origin)
    )
    .unwrap();

    let shown = limit.unwrap_or(occurrences.len()).min(occurrences.len());
    for occurrence in &occurrences[..shown] {
        occurrence_line(&mut out, transactions, occurrence, None);
    }
    truncated(&mut out, occurrences.len(), shown);
    out
}

/// Listing for "what values has this key taken?"
pub fn values_report(
    indexes: &Indexes,
    transactions: &[Transaction],
    key: &str,
    limit: Option<usize>,
) -> String {
    let mut out = String::new();
    let entries = indexes.values_of(key);

    if entries.is_empty() {
        writeln!(out, "Key {:?} not found", key).unwrap();
        return out;
    }

    let distinct = indexes.distinct_values(key);
    writeln!(
        out,
        "Key {:?}: {} occurrence(s), {} distinct value(s)",
        key,
        entries.len(),
        distinct.len()
    )
    .unwrap();

    let shown = limit.unwrap_or(entries.len()).min(entries.len());
    for entry in &entries[..shown] {
        occurrence_line(
            &mut out,
            transactions,
            &entry.occurrence,
            Some(entry.value.as_str()),
        );
    }
    truncated(&mut out, entries.len(), shown);
    out
}

/// Listing of values seen in more than one transaction
pub fn shared_report(indexes: &Indexes, limit: Option<usize>) -> String {
    let mut out = String::new();
    let shared = indexes.shared_values();

    writeln!(
        out,
        "{} value(s) appear in more than one transaction",
        shared.len()
    )
    .unwrap();
    let shown = limit.unwrap_or(shared.len()).min(shared.len());
    for item in &shared[..shown] {
        writeln!(
            out,
            "  {:?} in {} transactions, first at #{} {} {}",
            item.value,
            item.transactions,
            item.origin.transaction_id,
            item.origin.location,
            item.origin.path
        )
        .unwrap();
    }
    truncated(&mut out, shared.len(), shown);
    out
}

/// Summary counts
pub fn stats_report(stats: &ExportStats, shared: usize) -> String {
    let mut out = String::new();
    writeln!(out, "Transactions:  {}", stats.transactions).unwrap();
    if stats.skipped > 0 {
        writeln!(out, "Skipped:       {}", stats.skipped).unwrap();
    }
    writeln!(out, "Values:        {}", stats.values).unwrap();
    writeln!(out, "Keys:          {}", stats.keys).unwrap();
    writeln!(out, "Occurrences:   {}", stats.occurrences).unwrap();
    writeln!(out, "Shared values: {}", shared).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{build_indexes, ExtractOptions};

    fn sample() -> (Vec<Transaction>, Indexes) {
        let transactions = vec![
            Transaction {
                id: 0,
                method: "GET".to_string(),
                url: "https://api.example.com/login?user=alice&token=abc123".to_string(),
                status: 200,
                response_body: r#"{"clientId":"1500"}"#.to_string(),
                ..Default::default()
            },
            Transaction {
                id: 1,
                method: "POST".to_string(),
                url: "https://api.example.com/orders".to_string(),
                status: 201,
                request_body: "clientId=1500&qty=2".to_string(),
                ..Default::default()
            },
        ];
        let indexes = build_indexes(&transactions, ExtractOptions::default());
        (transactions, indexes)
    }

    #[test]
    fn test_export_json() {
        let (transactions, indexes) = sample();
        let export = IndexExport::new(
            &indexes,
            Some("capture.har".to_string()),
            transactions.len(),
            0,
        );
        let json: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert_eq!(json["source"], "capture.har");
        assert_eq!(json["stats"]["transactions"], 2);
        assert_eq!(json["stats"]["occurrences"], 5);
        assert_eq!(json["inverted"]["alice"][0]["location"], "query");
        assert_eq!(json["inverted"]["alice"][0]["path"], "user");
        assert_eq!(json["keys"]["clientId"][1]["value"], "1500");
        assert_eq!(json["keys"]["clientId"][1]["occurrence"]["location"], "request_body");
        assert!(json["generated_at"].as_str().is_some());
    }

    #[test]
    fn test_where_report() {
        let (transactions, indexes) = sample();
        let report = where_report(&indexes, &transactions, "1500", None);
        assert!(report.contains("Value \"1500\": 2 occurrence(s)"));
        assert!(report.contains("Origin: #0 response clientId"));
        assert!(report.contains("POST https://api.example.com/orders -> 201"));

        let missing = where_report(&indexes, &transactions, "nope", None);
        assert!(missing.contains("not found"));
    }

    #[test]
    fn test_values_report_limit() {
        let (transactions, indexes) = sample();
        let report = values_report(&indexes, &transactions, "clientId", Some(1));
        assert!(report.contains("2 occurrence(s), 1 distinct value(s)"));
        assert!(report.contains("... 1 more"));
        assert!(report.contains("= 1500"));
    }

    #[test]
    fn test_shared_report() {
        let (_, indexes) = sample();
        let report = shared_report(&indexes, None);
        assert!(report.starts_with("1 value(s)"));
        assert!(report.contains("\"1500\" in 2 transactions, first at #0 response clientId"));
    }

    #[test]
    fn test_stats_report() {
        let stats = ExportStats {
            transactions: 2,
            skipped: 1,
            values: 3,
            keys: 4,
            occurrences: 5,
        };
        let report = stats_report(&stats, 1);
        assert!(report.contains("Skipped:       1"));
        assert!(report.contains("Occurrences:   5"));
    }
}
