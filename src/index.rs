//! Inverted index (value -> occurrences) and key index (key -> values)
//!
//! Both indices are only ever written through [`IndexBuilder::insert`], which
//! appends the same triple to each. Buckets keep insertion order and retain
//! duplicates.

use crate::model::{Occurrence, Triple, VariableMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// A value together with where it was seen, as stored in the key index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedValue {
    pub value: String,
    pub occurrence: Occurrence,
}

pub type InvertedIndex = BTreeMap<String, Vec<Occurrence>>;
pub type KeyIndex = BTreeMap<String, Vec<KeyedValue>>;

/// Accumulates triples into both indices
#[derive(Debug, Default)]
pub struct IndexBuilder {
    inverted: InvertedIndex,
    keys: KeyIndex,
    inserted: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: Triple) {
        let Triple {
            key,
            value,
            occurrence,
        } = triple;

        self.inverted
            .entry(value.clone())
            .or_default()
            .push(occurrence.clone());
        self.keys
            .entry(key)
            .or_default()
            .push(KeyedValue { value, occurrence });
        self.inserted += 1;
    }

    /// Number of triples inserted so far
    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    pub fn finish(self) -> Indexes {
        Indexes {
            inverted: self.inverted,
            keys: self.keys,
            variables: VariableMap::new(),
        }
    }
}

impl Extend<Triple> for IndexBuilder {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

/// Counts describing a finished index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Distinct values
    pub values: usize,
    /// Distinct keys
    pub keys: usize,
    /// Total occurrences (one per extracted triple)
    pub occurrences: usize,
}

/// A value seen in more than one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedValue<'a> {
    pub value: &'a str,
    /// Earliest sighting
    pub origin: &'a Occurrence,
    /// Number of distinct transactions the value appears in
    pub transactions: usize,
}

/// Entry present in one index but not the other
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error("value {value:?} at {occurrence} has no matching key index entry")]
    MissingFromKeys {
        value: String,
        occurrence: Occurrence,
    },
    #[error("key {key:?} = {value:?} at {occurrence} has no matching inverted index entry")]
    MissingFromInverted {
        key: String,
        value: String,
        occurrence: Occurrence,
    },
}

/// The finished pair of indices, plus the reserved variable map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indexes {
    inverted: InvertedIndex,
    keys: KeyIndex,
    variables: VariableMap,
}

impl Indexes {
    pub fn inverted(&self) -> &InvertedIndex {
        &self.inverted
    }

    pub fn keys(&self) -> &KeyIndex {
        &self.keys
    }

    /// Promoted variables. Always empty after indexing.
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// Every sighting of `value`, in extraction order
    pub fn occurrences(&self, value: &str) -> &[Occurrence] {
        self.inverted.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every value `key` took, in extraction order
    pub fn values_of(&self, key: &str) -> &[KeyedValue] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values of `key` without repeats, in first-seen order
    pub fn distinct_values(&self, key: &str) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.values_of(key)
            .iter()
            .map(|kv| kv.value.as_str())
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Earliest sighting of `value`; ties go to the first one extracted
    pub fn origin(&self, value: &str) -> Option<&Occurrence> {
        self.occurrences(value).iter().min_by_key(|o| o.timestamp)
    }

    /// Values observed in two or more distinct transactions, ordered by value
    pub fn shared_values(&self) -> Vec<SharedValue<'_>> {
        self.inverted
            .iter()
            .filter_map(|(value, occurrences)| {
                let transactions = occurrences
                    .iter()
                    .map(|o| o.transaction_id)
                    .collect::<BTreeSet<_>>()
                    .len();
                if transactions < 2 {
                    return None;
                }
                let origin = occurrences.iter().min_by_key(|o| o.timestamp)?;
                Some(SharedValue {
                    value,
                    origin,
                    transactions,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            values: self.inverted.len(),
            keys: self.keys.len(),
            occurrences: self.inverted.values().map(Vec::len).sum(),
        }
    }

    /// Verify both indices hold exactly the same `(key, value, occurrence)` entries
    pub fn check_consistency(&self) -> Result<(), Inconsistency> {
        let mut balance: HashMap<(&str, &str, &Occurrence), i64> = HashMap::new();

        for (value, occurrences) in &self.inverted {
            for occurrence in occurrences {
                *balance
                    .entry((occurrence.path.as_str(), value.as_str(), occurrence))
                    .or_default() += 1;
            }
        }
        for (key, entries) in &self.keys {
            for entry in entries {
                *balance
                    .entry((key.as_str(), entry.value.as_str(), &entry.occurrence))
                    .or_default() -= 1;
            }
        }

        // Report deterministically: lowest offending occurrence first
        let mut offenders: Vec<_> = balance.into_iter().filter(|(_, n)| *n != 0).collect();
        offenders.sort_by_key(|((key, value, occ), _)| {
            (
                occ.timestamp,
                occ.transaction_id,
                occ.location,
                occ.path.as_str(),
                *key,
                *value,
            )
        });

        match offenders.first() {
            None => Ok(()),
            Some(((_, value, occurrence), n)) if *n > 0 => Err(Inconsistency::MissingFromKeys {
                value: value.to_string(),
                occurrence: (*occurrence).clone(),
            }),
            Some(((key, value, occurrence), _)) => Err(Inconsistency::MissingFromInverted {
                key: key.to_string(),
                value: value.to_string(),
                occurrence: (*occurrence).clone(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn inverted_mut(&mut self) -> &mut InvertedIndex {
        &mut self.inverted
    }
}
