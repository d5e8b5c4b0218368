//! Loader configuration.

use crate::cache::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Recognized loader options. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Maximum cached documents; `0` disables caching.
    pub cache_capacity: usize,
    /// Collect a `LoadReport` for every load.
    pub debug: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            debug: false,
        }
    }
}

impl LoaderConfig {
    /// Parses a JSON configuration object such as `{"debug": true}`.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
