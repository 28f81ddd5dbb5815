//! Transaction records, occurrences and the reserved variable map

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where inside a transaction a token was seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// URL query string
    Query,
    /// Request body (JSON or form data)
    RequestBody,
    /// Response body
    Response,
    RequestHeader,
    ResponseHeader,
}

impl Location {
    pub const ALL: [Location; 5] = [
        Location::Query,
        Location::RequestBody,
        Location::Response,
        Location::RequestHeader,
        Location::ResponseHeader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::RequestBody => "request_body",
            Location::Response => "response",
            Location::RequestHeader => "request_header",
            Location::ResponseHeader => "response_header",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sighting of a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// Id of the transaction the token was found in
    pub transaction_id: u64,
    pub location: Location,
    /// Key name the value was stored under
    pub path: String,
    /// Sort key; currently the transaction id
    pub timestamp: u64,
}

impl Occurrence {
    pub fn new(transaction_id: u64, location: Location, path: impl Into<String>) -> Self {
        Self {
            transaction_id,
            location,
            path: path.into(),
            timestamp: transaction_id,
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.transaction_id, self.location, self.path)
    }
}

/// A `(key, value, occurrence)` unit handed from the extractors to the index builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub key: String,
    pub value: String,
    pub occurrence: Occurrence,
}

impl Triple {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        transaction_id: u64,
        location: Location,
    ) -> Self {
        let key = key.into();
        let occurrence = Occurrence::new(transaction_id, location, key.clone());
        Self {
            key,
            value: value.into(),
            occurrence,
        }
    }
}

/// A single HTTP header as captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One normalized request/response pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequential id in ingestion order
    pub id: u64,
    /// Capture start time, kept verbatim
    pub started_at: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub request_body: String,
    pub response_body: String,
    pub request_headers: Vec<Header>,
    pub response_headers: Vec<Header>,
}

impl Transaction {
    /// Request body followed by one `name:value` line per request header
    pub fn request_payload(&self) -> String {
        merge_payload(&self.request_body, &self.request_headers)
    }

    /// Response body followed by one `name:value` line per response header
    pub fn response_payload(&self) -> String {
        merge_payload(&self.response_body, &self.response_headers)
    }
}

fn merge_payload(body: &str, headers: &[Header]) -> String {
    let mut payload = String::with_capacity(
        body.len()
            + headers
                .iter()
                .map(|h| h.name.len() + h.value.len() + 2)
                .sum::<usize>(),
    );
    payload.push_str(body);
    for header in headers {
        payload.push_str(&header.name);
        payload.push(':');
        payload.push_str(&header.value);
        payload.push('\n');
    }
    payload
}

/// A named placeholder for template generation, e.g. `${clientId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Representative value
    pub value: String,
    pub source: Occurrence,
}

/// Variable name -> variable. Not populated by the indexing pipeline.
pub type VariableMap = BTreeMap<String, Variable>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_tags() {
        let tags: Vec<&str> = Location::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            tags,
            ["query", "request_body", "response", "request_header", "response_header"]
        );
        for location in Location::ALL {
            let json = serde_json::to_string(&location).unwrap();
            assert_eq!(json, format!("\"{}\"", location));
        }
    }

    #[test]
    fn test_occurrence_timestamp_follows_transaction() {
        let occ = Occurrence::new(7, Location::Query, "user");
        assert_eq!(occ.timestamp, 7);
        assert_eq!(occ.to_string(), "#7 query user");
    }

    #[test]
    fn test_merged_payload_appends_header_lines() {
        let tx = Transaction {
            request_body: "a=1".to_string(),
            request_headers: vec![Header::new("Host", "x.test"), Header::new("Accept", "*/*")],
            ..Default::default()
        };
        assert_eq!(tx.request_payload(), "a=1Host:x.test\nAccept:*/*\n");
        assert_eq!(tx.response_payload(), "");
    }
}
