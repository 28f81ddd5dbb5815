//! Configuration file support for harxref
//!
//! Reads from .harxref/config.toml, or the file named by `HARXREF_CONFIG`

use crate::pipeline::ExtractOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HARXREF_CONFIG";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Which parts of each transaction get indexed
    #[serde(default)]
    pub extract: ExtractOptions,

    /// CLI listing settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Report/listing configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Maximum occurrences listed per value or key (0 = unlimited)
    /// Default: 20
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,

    /// Colorize terminal output
    /// Default: true
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_max_occurrences() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_occurrences: default_max_occurrences(),
            color: true,
        }
    }
}

impl Config {
    /// Load config from `HARXREF_CONFIG` or .harxref/config.toml
    /// Returns default config if no file is found or it cannot be parsed
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(Self::find_config_path);

        match path {
            Some(path) => Self::load_from(&path).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Load a specific file; `None` (with a warning) if it is unreadable or invalid
    pub fn load_from(path: &Path) -> Option<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "cannot read config, using defaults"
                );
                return None;
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "invalid config, using defaults"
                );
                None
            }
        }
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".harxref").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Listing cap, `None` when unlimited
    pub fn listing_limit(&self) -> Option<usize> {
        match self.report.max_occurrences {
            0 => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::HeaderMode;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.extract.query);
        assert!(config.extract.request_body);
        assert!(config.extract.response_body);
        assert_eq!(config.extract.headers, HeaderMode::Separate);
        assert_eq!(config.listing_limit(), Some(20));
        assert!(config.report.color);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[extract]
response_body = false
headers = "merged"

[report]
max_occurrences = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.extract.query);
        assert!(!config.extract.response_body);
        assert_eq!(config.extract.headers, HeaderMode::Merged);
        assert_eq!(config.listing_limit(), None);
        assert!(config.report.color);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[extract]\nheaders = \"sideways\"\n").unwrap();
        assert_eq!(Config::load_from(&path), None);

        std::fs::write(&path, "[extract]\nheaders = \"skip\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.extract.headers, HeaderMode::Skip);
    }
}
