//! Checksum computation, verification, and artifact naming

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;

/// Read size for streaming checksum computation
const CHUNK_SIZE: usize = 8192;

/// Outcome of verifying a plan artifact against its recorded checksum
///
/// `Missing` and `Mismatch` are both fatal to an apply, but they carry very
/// different guidance: a missing plan means "run plan first", a mismatch
/// means the artifact changed since it was produced and must not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanIntegrity {
    /// The file exists and its checksum matches the recorded value
    Verified,

    /// No file at the given path
    Missing,

    /// The file exists but its content has changed
    Mismatch {
        /// Checksum recorded when the plan was produced
        expected: String,
        /// Checksum of the file as it is now
        actual: String,
    },
}

/// Calculate the SHA-256 checksum of a plan file
///
/// Streams the file in fixed-size chunks; never loads the whole binary into
/// memory, so plan size is unbounded. Identical bytes always produce the
/// same hex string regardless of how the file was written.
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a plan file's checksum against an expected value
///
/// Any mismatch, including a missing or unreadable file, yields `false`.
/// This never errors; callers needing to distinguish "missing" from
/// "tampered" use [`verify_plan`].
pub fn verify_checksum(path: &Path, expected: &str) -> bool {
    match calculate_checksum(path) {
        Ok(actual) => actual == expected,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Checksum verification failed to read file");
            false
        }
    }
}

/// Verify a plan file, distinguishing absence from tampering
pub fn verify_plan(path: &Path, expected: &str) -> Result<PlanIntegrity> {
    if !path.exists() {
        return Ok(PlanIntegrity::Missing);
    }

    let actual = calculate_checksum(path)?;
    if actual == expected {
        Ok(PlanIntegrity::Verified)
    } else {
        warn!(
            path = %path.display(),
            expected = %expected,
            actual = %actual,
            "Plan artifact checksum mismatch"
        );
        Ok(PlanIntegrity::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Derive the deterministic artifact name for an `(environment, sha)` pair
///
/// Format: `tfplan-{environment}-{sha[:8]}.tfplan`. A SHA shorter than eight
/// characters is used whole. Environment names containing path separators are
/// the caller's responsibility; nothing is sanitized here. Collaborators (CI
/// cache keys, apply-time lookup) reproduce this exact format.
pub fn artifact_name(environment: &str, sha: &str) -> String {
    let short_sha: String = sha.chars().take(8).collect();
    format!("tfplan-{environment}-{short_sha}.tfplan")
}
