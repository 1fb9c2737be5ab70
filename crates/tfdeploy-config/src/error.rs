//! Error types for configuration loading and resolution
//!
//! Configuration errors are always raised eagerly, at load or resolve time.
//! Nothing in this crate defers a bad environment reference or a malformed
//! argument list into hook or terraform execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Configuration file exists but is empty
    #[error("Configuration file is empty: {0}")]
    Empty(PathBuf),

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or schema violation (unknown keys, wrong types)
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment reference points at an environment that does not exist
    ///
    /// Raised for `default-environment`, entries in `production-environments`,
    /// and any lookup of an unknown environment name. The message always lists
    /// the environments that are available.
    #[error("{kind} '{name}' is not defined in environments. Available environments: {available:?}")]
    UnknownEnvironment {
        /// Which reference was bad ("default-environment", "production-environment", "environment")
        kind: &'static str,
        /// The offending environment name
        name: String,
        /// Sorted list of defined environment names
        available: Vec<String>,
    },

    /// Structural validation failure (for example an empty environments map)
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
