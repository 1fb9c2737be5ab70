//! Plan artifact management
//!
//! A plan binary is written by one CI invocation and applied by a later,
//! possibly differently-scheduled one. The artifact is content-addressed:
//! its SHA-256 checksum is computed when the plan is produced and re-verified
//! before apply. The checksum mechanism detects modification between plan
//! and apply but does not prevent it; deployment serialization per
//! environment is handled by an external lock.
//!
//! Two failure modes matter and must never be conflated:
//!
//! - **Missing plan**: the operator never ran plan (or the CI cache expired).
//!   Actionable: run plan first.
//! - **Checksum mismatch**: the plan file changed since it was produced.
//!   A security-relevant condition that blocks apply outright.
//!
//! [`verify_plan`] makes that distinction a first-class return type instead
//! of relying on callers to order their own existence checks correctly.

pub mod checksum;
pub mod error;

use std::path::PathBuf;

pub use checksum::{artifact_name, calculate_checksum, verify_checksum, verify_plan, PlanIntegrity};
pub use error::{ArtifactError, Result};

/// Metadata for a stored plan artifact, keyed by `(environment, sha)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanArtifact {
    /// Target deployment environment
    pub environment: String,

    /// Git commit SHA the plan was taken from
    pub sha: String,

    /// Hex-encoded SHA-256 of the plan binary
    pub checksum: String,

    /// Location of the plan binary
    pub path: PathBuf,
}

impl PlanArtifact {
    /// The canonical file name for this artifact's `(environment, sha)` key
    pub fn file_name(&self) -> String {
        artifact_name(&self.environment, &self.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_the_artifact_convention() {
        let artifact = PlanArtifact {
            environment: "staging".to_string(),
            sha: "abc123def456789".to_string(),
            checksum: "deadbeef".to_string(),
            path: PathBuf::from("infra/tfplan-staging-abc123de.tfplan"),
        };
        assert_eq!(artifact.file_name(), "tfplan-staging-abc123de.tfplan");
    }
}
