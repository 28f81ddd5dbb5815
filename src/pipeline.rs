//! Per-transaction orchestration
//!
//! For each transaction, in order: query string, request body, response
//! body, then headers. All triples of one transaction reach the builder
//! before the next transaction starts.

use crate::extract::{extract_body, extract_headers, extract_query};
use crate::index::{IndexBuilder, Indexes};
use crate::model::{Location, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How header lists are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Index headers under `request_header`/`response_header`
    #[default]
    Separate,
    /// Append `name:value` lines to the body before extraction
    Merged,
    /// Ignore headers
    Skip,
}

impl HeaderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderMode::Separate => "separate",
            HeaderMode::Merged => "merged",
            HeaderMode::Skip => "skip",
        }
    }
}

impl fmt::Display for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "separate" => Ok(HeaderMode::Separate),
            "merged" => Ok(HeaderMode::Merged),
            "skip" => Ok(HeaderMode::Skip),
            other => Err(format!(
                "unknown header mode '{}' (expected separate, merged or skip)",
                other
            )),
        }
    }
}

/// Which sources get extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    #[serde(default = "default_true")]
    pub query: bool,
    #[serde(default = "default_true")]
    pub request_body: bool,
    #[serde(default = "default_true")]
    pub response_body: bool,
    #[serde(default)]
    pub headers: HeaderMode,
}

fn default_true() -> bool {
    true
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            query: true,
            request_body: true,
            response_body: true,
            headers: HeaderMode::Separate,
        }
    }
}

/// Drives extraction over transactions and owns the index builder
#[derive(Debug, Default)]
pub struct Indexer {
    options: ExtractOptions,
    builder: IndexBuilder,
    transactions: usize,
}

impl Indexer {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            builder: IndexBuilder::new(),
            transactions: 0,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Number of transactions indexed so far (repeats count again)
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    /// Extract every triple from `tx` and add it to both indices
    pub fn index_transaction(&mut self, tx: &Transaction) {
        let before = self.builder.len();
        let opts = self.options;

        if opts.query {
            self.builder.extend(extract_query(&tx.url, tx.id));
        }

        match opts.headers {
            HeaderMode::Merged => {
                if opts.request_body {
                    self.builder
                        .extend(extract_body(&tx.request_payload(), tx.id, Location::RequestBody));
                }
                if opts.response_body {
                    self.builder
                        .extend(extract_body(&tx.response_payload(), tx.id, Location::Response));
                }
            }
            HeaderMode::Separate | HeaderMode::Skip => {
                if opts.request_body {
                    self.builder
                        .extend(extract_body(&tx.request_body, tx.id, Location::RequestBody));
                }
                if opts.response_body {
                    self.builder
                        .extend(extract_body(&tx.response_body, tx.id, Location::Response));
                }
                if opts.headers == HeaderMode::Separate {
                    self.builder.extend(extract_headers(
                        &tx.request_headers,
                        tx.id,
                        Location::RequestHeader,
                    ));
                    self.builder.extend(extract_headers(
                        &tx.response_headers,
                        tx.id,
                        Location::ResponseHeader,
                    ));
                }
            }
        }

        self.transactions += 1;
        tracing::debug!(
            transaction = tx.id,
            method = %tx.method,
            url = %tx.url,
            triples = self.builder.len() - before,
            "indexed transaction"
        );
    }

    /// Index `transactions` in slice order
    pub fn index_all(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            self.index_transaction(tx);
        }
    }

    pub fn finish(self) -> Indexes {
        let indexes = self.builder.finish();
        let stats = indexes.stats();
        tracing::info!(
            transactions = self.transactions,
            values = stats.values,
            keys = stats.keys,
            occurrences = stats.occurrences,
            "index built"
        );
        indexes
    }
}

/// Index every transaction with the given options
pub fn build_indexes(transactions: &[Transaction], options: ExtractOptions) -> Indexes {
    let mut indexer = Indexer::new(options);
    indexer.index_all(transactions);
    indexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Header, Occurrence};

    fn login_tx(id: u64) -> Transaction {
        Transaction {
            id,
            started_at: "2025-09-28T10:00:00.000Z".to_string(),
            method: "POST".to_string(),
            url: "https://api.example.com/login?user=alice&token=abc123".to_string(),
            status: 200,
            request_body: "password=hunter2".to_string(),
            response_body: r#"{"clientId":"1500","ok":true}"#.to_string(),
            request_headers: vec![Header::new("Accept", "application/json")],
            response_headers: vec![Header::new("X-Request-Id", "r-1")],
        }
    }

    #[test]
    fn test_login_scenario() {
        let idx = build_indexes(&[login_tx(3)], ExtractOptions::default());
        assert_eq!(idx.occurrences("alice"), &[Occurrence::new(3, Location::Query, "user")]);
        assert_eq!(idx.occurrences("abc123"), &[Occurrence::new(3, Location::Query, "token")]);
        assert_eq!(
            idx.occurrences("hunter2"),
            &[Occurrence::new(3, Location::RequestBody, "password")]
        );
        assert_eq!(
            idx.occurrences("1500"),
            &[Occurrence::new(3, Location::Response, "clientId")]
        );
        assert_eq!(idx.occurrences("true"), &[Occurrence::new(3, Location::Response, "ok")]);
        assert_eq!(
            idx.occurrences("r-1"),
            &[Occurrence::new(3, Location::ResponseHeader, "X-Request-Id")]
        );
        assert!(idx.check_consistency().is_ok());
    }

    #[test]
    fn test_every_source_extracted() {
        let idx = build_indexes(&[login_tx(0)], ExtractOptions::default());
        let mut all: Vec<&Occurrence> = idx.inverted().values().flatten().collect();
        all.sort_by_key(|o| o.location);
        let locations: Vec<Location> = all.iter().map(|o| o.location).collect();
        assert_eq!(
            locations,
            vec![
                Location::Query,
                Location::Query,
                Location::RequestBody,
                Location::Response,
                Location::Response,
                Location::RequestHeader,
                Location::ResponseHeader,
            ]
        );
    }

    #[test]
    fn test_reindexing_doubles_sequences() {
        let tx = login_tx(1);
        let mut indexer = Indexer::new(ExtractOptions::default());
        indexer.index_transaction(&tx);
        let once = indexer.builder.len();
        indexer.index_transaction(&tx);
        assert_eq!(indexer.builder.len(), once * 2);
        assert_eq!(indexer.transactions(), 2);

        let idx = indexer.finish();
        assert_eq!(idx.occurrences("alice").len(), 2);
        assert_eq!(idx.occurrences("alice")[0], idx.occurrences("alice")[1]);
        assert_eq!(idx.values_of("user").len(), 2);
        assert_eq!(idx.stats().occurrences, once * 2);
    }

    #[test]
    fn test_order_follows_slice() {
        let txs = vec![login_tx(0), login_tx(1), login_tx(2)];
        let idx = build_indexes(&txs, ExtractOptions::default());
        let ids: Vec<u64> = idx.occurrences("alice").iter().map(|o| o.transaction_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_merged_headers_break_json() {
        let options = ExtractOptions {
            headers: HeaderMode::Merged,
            ..Default::default()
        };
        let idx = build_indexes(&[login_tx(0)], options);
        // body + header lines is no longer a JSON object, and has no `=`
        assert!(idx.occurrences("1500").is_empty());
        assert!(idx.values_of("clientId").is_empty());
        assert!(idx.values_of("X-Request-Id").is_empty());
        // form bodies absorb the header lines into the last value
        assert_eq!(
            idx.distinct_values("password"),
            vec!["hunter2Accept:application/json\n"]
        );
    }

    #[test]
    fn test_skip_headers_and_sources() {
        let options = ExtractOptions {
            query: false,
            response_body: false,
            headers: HeaderMode::Skip,
            ..Default::default()
        };
        let idx = build_indexes(&[login_tx(0)], options);
        assert_eq!(idx.stats().occurrences, 1);
        assert_eq!(idx.distinct_values("password"), vec!["hunter2"]);
    }

    #[test]
    fn test_header_mode_parsing() {
        assert_eq!("merged".parse::<HeaderMode>(), Ok(HeaderMode::Merged));
        assert_eq!("separate".parse::<HeaderMode>(), Ok(HeaderMode::Separate));
        assert!("both".parse::<HeaderMode>().is_err());
        assert_eq!(HeaderMode::Skip.to_string(), "skip");
    }
}
