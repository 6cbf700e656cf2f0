//! Run configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Unknown keys are rejected.

use serde::Deserialize;
use std::fmt;

/// Settings for one bridge run, usually read from a `bridge.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Namespace prefixed to every runtime conversion helper.
    pub runtime_namespace: String,
    /// Extra identifiers that user code must not use verbatim.
    pub reserved_identifiers: Vec<String>,
    /// Prefix of synthetic interface adapter names.
    pub wrapper_prefix: String,
    /// Emit enumerations before every other type.
    pub enums_first: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            runtime_namespace: "::Runtime".to_string(),
            reserved_identifiers: Vec::new(),
            wrapper_prefix: "Wrapper__".to_string(),
            enums_first: true,
        }
    }
}

/// A configuration file that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to parse bridge config: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl BridgeConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<BridgeConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError {
            message: e.to_string(),
        })
    }
}
