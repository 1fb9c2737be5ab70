//! Error types for artifact operations

use thiserror::Error;

/// Errors that can occur while handling plan artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The plan file could not be read
    #[error("Failed to read plan file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for artifact operations
pub type Result<T> = std::result::Result<T, ArtifactError>;
