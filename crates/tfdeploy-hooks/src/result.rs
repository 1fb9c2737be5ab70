//! Outcome of a single hook execution

use crate::phase::HookPhase;

/// Exit code synthesized for a hook that exceeded its timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Result of executing (or skipping) one hook
///
/// The outcome taxonomy is deliberate: success, failure, timeout, and skip
/// are distinct so a misbehaving check can never silently swallow a failure,
/// and a skip is never counted as one.
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Hook name from configuration
    pub name: String,

    /// Phase the hook ran in
    pub phase: HookPhase,

    /// Process exit code (124 when timed out, 1 on launch failure)
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Whether the hook was killed for exceeding its timeout
    pub timed_out: bool,

    /// Whether the hook was skipped (condition not met)
    pub skipped: bool,

    /// Human-readable reason the hook was skipped
    pub skip_reason: Option<String>,
}

impl HookResult {
    /// A skipped result, with the reason the condition was not met
    pub fn skipped(name: &str, phase: HookPhase, reason: String) -> Self {
        Self {
            name: name.to_string(),
            phase,
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            skipped: true,
            skip_reason: Some(reason),
        }
    }

    /// The hook exited zero without timing out
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// The hook ran and did not succeed; skips are never failures
    pub fn failed(&self) -> bool {
        !self.success() && !self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, timed_out: bool, skipped: bool) -> HookResult {
        HookResult {
            name: "check".to_string(),
            phase: HookPhase::PrePlan,
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            timed_out,
            skipped,
            skip_reason: None,
        }
    }

    #[test]
    fn zero_exit_is_success() {
        assert!(result(0, false, false).success());
        assert!(!result(0, false, false).failed());
    }

    #[test]
    fn nonzero_exit_is_failure() {
        assert!(!result(1, false, false).success());
        assert!(result(1, false, false).failed());
    }

    #[test]
    fn timeout_is_failure_even_with_zero_exit() {
        assert!(!result(0, true, false).success());
        assert!(result(0, true, false).failed());
    }

    #[test]
    fn skip_is_never_a_failure() {
        let skipped = HookResult::skipped("check", HookPhase::PrePlan, "condition".to_string());
        assert!(!skipped.failed());
        assert!(skipped.success());
    }
}
