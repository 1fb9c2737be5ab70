//! Result types for terraform command invocations

use std::path::PathBuf;

/// Result of one command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Process exit code
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Full argument vector the command was invoked with
    pub command: Vec<String>,
}

impl CommandResult {
    /// The command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of `terraform plan`
///
/// `exit_code` is normalized: terraform's detailed exit code 2 (success,
/// changes present) is reported as 0 with `has_changes` set, so `success()`
/// keeps its usual meaning. The original exit-code distinction survives in
/// `has_changes`.
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Normalized exit code (0 on success with or without changes)
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Full argument vector the command was invoked with
    pub command: Vec<String>,

    /// Whether terraform reported pending changes (detailed exit code 2)
    pub has_changes: bool,

    /// Location of the plan binary, when one was produced
    pub plan_file: Option<PathBuf>,

    /// SHA-256 of the plan binary, when one was produced
    pub checksum: Option<String>,
}

impl PlanResult {
    /// The plan completed (with or without changes)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of `terraform apply`
#[derive(Debug, Clone)]
pub struct ApplyResult {
    /// Process exit code
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Full argument vector the command was invoked with
    pub command: Vec<String>,
}

impl ApplyResult {
    /// The apply exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
