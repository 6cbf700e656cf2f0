//! Shared types for the bridge backend.
//!
//! Errors, configuration and the naming tables every later phase shares
//! for the length of one run.

pub mod config;
pub mod error;
pub mod names;
pub mod wrappers;

pub use config::{BridgeConfig, ConfigError};
pub use error::{BridgeError, BridgeWarning, Diagnostics, Severity};
pub use names::NameFixup;
pub use wrappers::{SyntheticNames, WrapperNames};
