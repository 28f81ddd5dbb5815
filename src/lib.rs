//! harxref - cross-reference the keys and values of captured HTTP traffic
//!
//! Answer "where did this value come from?" and "what values has this key
//! taken?" for every token in a HAR capture.
//!
//! # Overview
//!
//! Each transaction (request/response pair) is scanned for key/value pairs.
//! Every pair becomes an [`Occurrence`] recording the transaction, the
//! location and the key, and is added to two indices built in lock-step:
//!
//! - the inverted index, value -> occurrences
//! - the key index, key -> (value, occurrence)
//!
//! # Locations
//!
//! | Tag | Source |
//! |-----|--------|
//! | `query` | URL query string, `key=value&...` |
//! | `request_body` | JSON object members, or form pairs when not JSON |
//! | `response` | Same rules, response body |
//! | `request_header` | Request header name/value |
//! | `response_header` | Response header name/value |
//!
//! # Quick Start
//!
//! ```
//! use harxref::{build_indexes, ExtractOptions, Location, Transaction};
//!
//! let tx = Transaction {
//!     id: 3,
//!     url: "https://api.example.com/login?user=alice&token=abc123".to_string(),
//!     ..Default::default()
//! };
//!
//! let indexes = build_indexes(&[tx], ExtractOptions::default());
//! let origin = indexes.origin("abc123").unwrap();
//! assert_eq!(origin.transaction_id, 3);
//! assert_eq!(origin.location, Location::Query);
//! assert_eq!(origin.path, "token");
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod har;
pub mod index;
pub mod model;
pub mod pipeline;
pub mod scan;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{
    shared_report, stats_report, values_report, where_report, ExportStats, IndexExport,
};
pub use extract::{extract_body, extract_headers, extract_query, BodyFormat, ScalarValue};
pub use har::{load_har, parse_har, HarCapture};
pub use index::{Inconsistency, IndexBuilder, IndexStats, Indexes, KeyedValue, SharedValue};
pub use model::{Header, Location, Occurrence, Transaction, Triple, Variable, VariableMap};
pub use pipeline::{build_indexes, ExtractOptions, HeaderMode, Indexer};
pub use scan::PairScanner;
