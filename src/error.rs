//! Error type for the outer layers (HAR loading, export, consistency checks)
//!
//! Extraction itself never fails: undecodable bodies fall back to form
//! scanning and malformed fragments are skipped.

use crate::index::Inconsistency;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HAR document has no log.entries array")]
    MissingEntries,

    #[error("indices diverged: {0}")]
    Inconsistent(#[from] Inconsistency),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
