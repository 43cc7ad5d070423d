//! Engine configuration.
//!
//! Everything here has a default; callers only override what they need.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tunables for the rule evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minutes added to the end of a restrictive block when reporting the
    /// unlock instant. Block ends are exclusive, so the default of one
    /// minute lands on the first minute the app is free again.
    pub restrictive_unlock_offset_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            restrictive_unlock_offset_minutes: 1,
        }
    }
}

impl EngineConfig {
    /// Config that reports raw range ends, without any offset.
    pub fn exact() -> Self {
        Self {
            restrictive_unlock_offset_minutes: 0,
        }
    }

    /// Sets the restrictive unlock offset.
    pub fn with_restrictive_unlock_offset(mut self, minutes: u32) -> Self {
        self.restrictive_unlock_offset_minutes = minutes;
        self
    }

    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the config to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
