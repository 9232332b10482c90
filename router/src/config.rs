//! Router configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is a
//! valid configuration. CLI flags override file values.

use crate::encoding::Encoding;
use crate::error::{RouteError, RouteResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Key under which the dispatch snapshot is stored in a key-value cache
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// Use the key-value cache collaborator when one is supplied
    #[serde(default = "default_enable_cache")]
    pub enable_cache: bool,

    /// Persist the dispatch snapshot to `cache_path` instead
    #[serde(default)]
    pub save_to_file: bool,

    /// Snapshot file location
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// RFC 3986 encoding (`true`) or legacy form encoding (`false`)
    #[serde(default = "default_encode_raw")]
    pub encode_raw: bool,

    /// Default scheme for absolute URLs
    #[serde(default)]
    pub scheme: Option<String>,

    /// Default host for absolute URLs
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_key: default_cache_key(),
            enable_cache: default_enable_cache(),
            save_to_file: false,
            cache_path: default_cache_path(),
            encode_raw: default_encode_raw(),
            scheme: None,
            host: None,
        }
    }
}

impl RouterConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> RouteResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RouteError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = serde_json::from_str(&content)
            .map_err(|e| RouteError::Config(format!("Failed to parse config JSON: {}", e)))?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> RouteResult<()> {
        if self.cache_key.is_empty() {
            return Err(RouteError::Config("Cache key cannot be empty".to_string()));
        }
        if self.save_to_file && self.cache_path.is_empty() {
            return Err(RouteError::Config(
                "Cache path cannot be empty when saving to file".to_string(),
            ));
        }
        if let Some(scheme) = &self.scheme {
            let valid = scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return Err(RouteError::Config(format!("Invalid scheme: {:?}", scheme)));
            }
        }
        if self.host.as_deref() == Some("") {
            return Err(RouteError::Config("Host cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Encoding strategy selected by `encode_raw`
    pub fn encoding(&self) -> Encoding {
        Encoding::from_raw_flag(self.encode_raw)
    }
}

// Default function values for serde
fn default_cache_key() -> String { "routes-cache".to_string() }
fn default_enable_cache() -> bool { true }
fn default_cache_path() -> String { "runtime/routes-cache.json".to_string() }
fn default_encode_raw() -> bool { true }
