//! Error types for terraform execution

use thiserror::Error;

/// Errors that can occur while invoking terraform
///
/// A non-zero terraform exit code is not an error at this level; it is part
/// of the [`crate::CommandResult`] so callers can interpret the exit-code
/// contract. Only a failure to launch or communicate with the subprocess
/// surfaces here.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The subprocess could not be spawned or its output could not be read
    #[error("Failed to run {command}: {source}")]
    Launch {
        /// The program that failed to launch
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;
