//! Runtime configuration for a [`crate::BlockGraph`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::limits::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_LINK_DISTANCE};

/// Graph-wide settings. Every field has a default, so a config document only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GraphConfig {
    /// Register declaration blocks as stub parents on construction.
    pub stub_linking: bool,
    /// Snapping radius used by `get_link`.
    pub max_link_distance: f64,
    /// zstd level used by compressed saves.
    pub compression_level: i32,
    /// Log a warning when a program was saved under a different language.
    pub check_language_fingerprint: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            stub_linking: true,
            max_link_distance: DEFAULT_MAX_LINK_DISTANCE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            check_language_fingerprint: true,
        }
    }
}

impl GraphConfig {
    /// Parses a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = GraphConfig::from_json(r#"{"stub-linking": false}"#).unwrap();
        assert!(!config.stub_linking);
        assert_eq!(config.max_link_distance, DEFAULT_MAX_LINK_DISTANCE);
        assert!(config.check_language_fingerprint);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            GraphConfig::from_json("{\"max-link-distance\": \"far\"}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
