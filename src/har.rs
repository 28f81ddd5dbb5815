//! HAR capture decoding
//!
//! Reads `log.entries` and turns each entry into a [`Transaction`]. An entry
//! missing a required field (start time, method, URL, status) is skipped with
//! a warning; ids are assigned sequentially over the entries that decode.

use crate::error::{Error, Result};
use crate::model::{Header, Transaction};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarEntry {
    started_date_time: String,
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    post_data: Option<HarPostData>,
}

#[derive(Debug, Deserialize)]
struct HarPostData {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HarResponse {
    status: u16,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    content: Option<HarContent>,
}

#[derive(Debug, Deserialize)]
struct HarContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

impl From<HarHeader> for Header {
    fn from(h: HarHeader) -> Self {
        Header::new(h.name, h.value)
    }
}

/// Transactions decoded from one capture
#[derive(Debug, Clone, Default)]
pub struct HarCapture {
    pub transactions: Vec<Transaction>,
    /// Entries that could not be decoded
    pub skipped: usize,
}

/// Read and decode a HAR file
pub fn load_har(path: &Path) -> Result<HarCapture> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let capture = parse_har(&text)?;
    tracing::info!(
        path = %path.display(),
        transactions = capture.transactions.len(),
        skipped = capture.skipped,
        "loaded capture"
    );
    Ok(capture)
}

/// Decode HAR text
pub fn parse_har(text: &str) -> Result<HarCapture> {
    let doc: Value = serde_json::from_str(text)?;
    let entries = doc
        .get("log")
        .and_then(|log| log.get("entries"))
        .and_then(Value::as_array)
        .ok_or(Error::MissingEntries)?;

    let mut capture = HarCapture::default();
    for (position, raw) in entries.iter().enumerate() {
        match HarEntry::deserialize(raw) {
            Ok(entry) => {
                let id = capture.transactions.len() as u64;
                capture.transactions.push(to_transaction(entry, id));
            }
            Err(err) => {
                tracing::warn!(entry = position, error = %err, "skipping undecodable HAR entry");
                capture.skipped += 1;
            }
        }
    }
    Ok(capture)
}

fn to_transaction(entry: HarEntry, id: u64) -> Transaction {
    let request_body = entry
        .request
        .post_data
        .and_then(|p| p.text)
        .unwrap_or_default();

    let response_body = match entry.response.content {
        // base64 payloads are binary or compressed; scanning them only yields noise
        Some(HarContent {
            encoding: Some(ref enc),
            ..
        }) if enc.eq_ignore_ascii_case("base64") => {
            tracing::debug!(transaction = id, "ignoring base64-encoded response body");
            String::new()
        }
        Some(content) => content.text.unwrap_or_default(),
        None => String::new(),
    };

    Transaction {
        id,
        started_at: entry.started_date_time,
        method: entry.request.method,
        url: entry.request.url,
        status: entry.response.status,
        request_body,
        response_body,
        request_headers: entry.request.headers.into_iter().map(Header::from).collect(),
        response_headers: entry.response.headers.into_iter().map(Header::from).collect(),
    }
}
