//! Key/value extraction from query strings, bodies and headers
//!
//! Every extractor is infallible and returns triples in the order the pairs
//! appear in the input.

use crate::model::{Header, Location, Triple};
use crate::scan::{query_component, PairScanner};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;

/// Flat view of a JSON member value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
    /// Array or object; not extracted
    Nested,
}

impl ScalarValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => ScalarValue::Text(s.clone()),
            Value::Number(n) => ScalarValue::Number(n.clone()),
            Value::Bool(b) => ScalarValue::Bool(*b),
            Value::Null => ScalarValue::Null,
            Value::Array(_) | Value::Object(_) => ScalarValue::Nested,
        }
    }

    /// Text stored in the indices, `None` when the member is skipped
    ///
    /// Strings pass through, numbers keep the digits written in the source,
    /// booleans become `"true"`/`"false"`. Null, arrays and objects are
    /// skipped.
    pub fn into_index_text(self) -> Option<String> {
        match self {
            ScalarValue::Text(s) => Some(s),
            ScalarValue::Number(n) => Some(n.to_string()),
            ScalarValue::Bool(b) => Some(b.to_string()),
            ScalarValue::Null | ScalarValue::Nested => None,
        }
    }
}

/// Top-level members of a JSON object in document order, repeated keys included
struct ObjectMembers(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for ObjectMembers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MembersVisitor;

        impl<'de> Visitor<'de> for MembersVisitor {
            type Value = ObjectMembers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(member) = map.next_entry::<String, Value>()? {
                    members.push(member);
                }
                Ok(ObjectMembers(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor)
    }
}

/// Which decoding path a body took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

/// Pairs from the query component of `url`
pub fn extract_query(url: &str, transaction_id: u64) -> Vec<Triple> {
    match query_component(url) {
        Some(query) => extract_form(query, transaction_id, Location::Query),
        None => Vec::new(),
    }
}

/// Pairs from a form-encoded blob, tagged with `location`
pub fn extract_form(blob: &str, transaction_id: u64, location: Location) -> Vec<Triple> {
    PairScanner::new(blob)
        .map(|(key, value)| Triple::new(key, value, transaction_id, location))
        .collect()
}

/// Pairs from a body: top-level JSON object members, or form pairs when the
/// blob is not a JSON object
pub fn extract_body(blob: &str, transaction_id: u64, location: Location) -> Vec<Triple> {
    extract_body_with_format(blob, transaction_id, location).0
}

/// Like [`extract_body`] but also reports which path was taken
pub fn extract_body_with_format(
    blob: &str,
    transaction_id: u64,
    location: Location,
) -> (Vec<Triple>, BodyFormat) {
    match serde_json::from_str::<ObjectMembers>(blob) {
        Ok(ObjectMembers(members)) => {
            let triples = members
                .into_iter()
                .filter_map(|(key, value)| {
                    ScalarValue::from_json(&value)
                        .into_index_text()
                        .map(|text| Triple::new(key, text, transaction_id, location))
                })
                .collect();
            (triples, BodyFormat::Json)
        }
        Err(_) => (
            extract_form(blob, transaction_id, location),
            BodyFormat::Form,
        ),
    }
}

/// One triple per header, keyed by the header name as captured
pub fn extract_headers(headers: &[Header], transaction_id: u64, location: Location) -> Vec<Triple> {
    headers
        .iter()
        .map(|h| Triple::new(h.name.as_str(), h.value.as_str(), transaction_id, location))
        .collect()
}
