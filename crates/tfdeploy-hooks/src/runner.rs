//! Hook runner: phase-scoped execution with blocking semantics
//!
//! The runner executes all hooks configured for one phase, strictly one at a
//! time in definition order. It filters by condition, injects the `TF_BD_*`
//! context, enforces per-hook timeouts, and stops the phase at the first
//! blocking failure. It never propagates raw process errors: a timeout or
//! launch failure is converted to a [`HookResult`] at the point of invocation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tfdeploy_config::{HookSpec, HooksConfig};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::context::HookContext;
use crate::phase::HookPhase;
use crate::result::{HookResult, TIMEOUT_EXIT_CODE};

/// Runs lifecycle hooks for one phase at a time
///
/// Phase sequencing across a deployment attempt belongs to the caller's
/// pipeline; the runner's contract is "run all hooks for one phase and
/// report every outcome".
#[derive(Debug, Clone)]
pub struct HookRunner {
    hooks: Option<HooksConfig>,
    working_directory: PathBuf,
}

impl HookRunner {
    /// Create a runner over the configured hooks
    ///
    /// `working_directory` is the default for hooks that do not override it.
    pub fn new(hooks: Option<HooksConfig>, working_directory: PathBuf) -> Self {
        Self {
            hooks,
            working_directory,
        }
    }

    fn hooks_for_phase(&self, phase: HookPhase) -> &[HookSpec] {
        let Some(config) = &self.hooks else {
            return &[];
        };
        match phase {
            HookPhase::PreInit => &config.pre_init,
            HookPhase::PostInit => &config.post_init,
            HookPhase::PrePlan => &config.pre_plan,
            HookPhase::PostPlan => &config.post_plan,
            HookPhase::PostApply => &config.post_apply,
        }
    }

    /// Run all hooks configured for a phase
    ///
    /// Returns one result per hook considered, in definition order. A hook
    /// whose condition is not met contributes a skipped result. A failure
    /// with `fail-on-error: true` stops the remaining hooks in this phase;
    /// already-collected results are unaffected and the caller decides
    /// whether subsequent phases run. A phase with no configured hooks
    /// returns an empty list without evaluating the context.
    pub async fn run_phase(&self, phase: HookPhase, context: &HookContext) -> Vec<HookResult> {
        let hooks = self.hooks_for_phase(phase);
        if hooks.is_empty() {
            return Vec::new();
        }

        info!(phase = %phase, count = hooks.len(), "Running hooks");

        let mut results = Vec::with_capacity(hooks.len());
        for hook in hooks {
            if !hook
                .condition
                .should_run(&context.operation, context.is_rollback)
            {
                let reason = format!(
                    "Condition '{}' not met for operation '{}'",
                    hook.condition, context.operation
                );
                debug!(hook = %hook.name, phase = %phase, reason = %reason, "Skipping hook");
                results.push(HookResult::skipped(&hook.name, phase, reason));
                continue;
            }

            let result = self.run_hook(hook, phase, context).await;
            let failed = result.failed();
            results.push(result);

            if failed && hook.fail_on_error {
                error!(
                    hook = %hook.name,
                    phase = %phase,
                    "Hook failed (blocking); remaining hooks in this phase are not run"
                );
                break;
            } else if failed {
                warn!(hook = %hook.name, phase = %phase, "Hook failed (non-blocking)");
            } else {
                debug!(hook = %hook.name, phase = %phase, "Hook succeeded");
            }
        }

        results
    }

    /// Execute a single hook with timeout enforcement
    ///
    /// Process environment = ambient environment ∪ context ∪ hook overrides,
    /// hook overrides winning on conflict. The three execution outcomes
    /// (normal exit, timeout, launch failure) all become a result here;
    /// nothing escapes as an error.
    async fn run_hook(
        &self,
        hook: &HookSpec,
        phase: HookPhase,
        context: &HookContext,
    ) -> HookResult {
        let cwd = hook
            .working_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.working_directory.clone());

        debug!(hook = %hook.name, cwd = %cwd.display(), "Executing hook");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&hook.run)
            .current_dir(&cwd)
            .envs(context.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(overrides) = &hook.env {
            cmd.envs(overrides);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return HookResult {
                    name: hook.name.clone(),
                    phase,
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: format!("Failed to launch hook '{}': {}", hook.name, e),
                    timed_out: false,
                    skipped: false,
                    skip_reason: None,
                };
            }
        };

        match timeout(Duration::from_secs(hook.timeout), child.wait_with_output()).await {
            Ok(Ok(output)) => HookResult {
                name: hook.name.clone(),
                phase,
                exit_code: output.status.code().unwrap_or(1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                timed_out: false,
                skipped: false,
                skip_reason: None,
            },
            Ok(Err(e)) => HookResult {
                name: hook.name.clone(),
                phase,
                exit_code: 1,
                stdout: String::new(),
                stderr: e.to_string(),
                timed_out: false,
                skipped: false,
                skip_reason: None,
            },
            // kill_on_drop terminates the child when the future is dropped
            Err(_) => HookResult {
                name: hook.name.clone(),
                phase,
                exit_code: TIMEOUT_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("Hook timed out after {} seconds", hook.timeout),
                timed_out: true,
                skipped: false,
                skip_reason: None,
            },
        }
    }

    /// Whether any result in a phase constitutes a blocking failure
    ///
    /// Scans the whole list rather than assuming the failure is last, even
    /// though phase execution stops at the first blocking failure.
    pub fn has_blocking_failure(results: &[HookResult]) -> bool {
        results.iter().any(|r| r.failed())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tfdeploy_config::HookCondition;

    use super::*;

    fn hook(name: &str, run: &str) -> HookSpec {
        HookSpec {
            name: name.to_string(),
            run: run.to_string(),
            condition: HookCondition::Always,
            fail_on_error: true,
            timeout: 600,
            env: None,
            working_directory: None,
        }
    }

    fn context(operation: &str, is_rollback: bool) -> HookContext {
        HookContext {
            phase: HookPhase::PrePlan,
            environment: "dev".to_string(),
            operation: operation.to_string(),
            is_rollback,
            sha: "abc123def456".to_string(),
            r#ref: "feature/vpc".to_string(),
            actor: "octocat".to_string(),
            pr_number: "42".to_string(),
            params: String::new(),
            working_dir: PathBuf::from("."),
            is_production: false,
            plan_file: None,
            has_changes: None,
        }
    }

    fn runner_with(pre_plan: Vec<HookSpec>) -> HookRunner {
        let config = HooksConfig {
            pre_plan,
            ..HooksConfig::default()
        };
        HookRunner::new(Some(config), PathBuf::from("."))
    }

    #[tokio::test]
    async fn empty_phase_returns_empty_list() {
        let runner = HookRunner::new(None, PathBuf::from("."));
        let results = runner
            .run_phase(HookPhase::PreInit, &context("plan", false))
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn successful_hook_captures_output() {
        let runner = runner_with(vec![hook("greet", "echo hello")]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].success());
        assert_eq!(results[0].stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn context_env_is_injected() {
        let runner = runner_with(vec![hook(
            "check-env",
            "test \"$TF_BD_OPERATION\" = plan && test \"$TF_BD_IS_PRODUCTION\" = false",
        )]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert!(results[0].success());
    }

    #[tokio::test]
    async fn hook_env_overrides_context_on_conflict() {
        let mut h = hook("check-env", "test \"$TF_BD_ENVIRONMENT\" = overridden");
        h.env = Some(HashMap::from([(
            "TF_BD_ENVIRONMENT".to_string(),
            "overridden".to_string(),
        )]));
        let runner = runner_with(vec![h]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert!(results[0].success());
    }

    #[tokio::test]
    async fn working_directory_override_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = hook("where", "pwd");
        h.working_directory = Some(dir.path().display().to_string());
        let runner = runner_with(vec![h]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert!(results[0].success());
        assert!(results[0].stdout.trim().ends_with(
            dir.path()
                .file_name()
                .unwrap()
                .to_str()
                .unwrap()
        ));
    }

    #[tokio::test]
    async fn condition_not_met_yields_skip_with_reason() {
        let mut h = hook("apply-notify", "echo notify");
        h.condition = HookCondition::ApplyOnly;
        let runner = runner_with(vec![h]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].skipped);
        assert!(!results[0].failed());
        let reason = results[0].skip_reason.as_deref().unwrap();
        assert!(reason.contains("apply-only"));
        assert!(reason.contains("plan"));
    }

    #[tokio::test]
    async fn rollback_only_runs_on_rollback() {
        let mut h = hook("rollback-notify", "echo rolled back");
        h.condition = HookCondition::RollbackOnly;
        let runner = runner_with(vec![h.clone()]);

        let results = runner
            .run_phase(HookPhase::PrePlan, &context("rollback", true))
            .await;
        assert!(results[0].success());

        let runner = runner_with(vec![h]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("apply", false))
            .await;
        assert!(results[0].skipped);
    }

    #[tokio::test]
    async fn blocking_failure_stops_the_phase() {
        let marker = tempfile::tempdir().unwrap();
        let touched = marker.path().join("second-ran");
        let runner = runner_with(vec![
            hook("failing", "exit 1"),
            hook("second", &format!("touch {}", touched.display())),
        ]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        // The second hook's result never appears and it never executed.
        assert_eq!(results.len(), 1);
        assert!(results[0].failed());
        assert!(!touched.exists());
        assert!(HookRunner::has_blocking_failure(&results));
    }

    #[tokio::test]
    async fn non_blocking_failure_continues() {
        let mut advisory = hook("advisory", "exit 1");
        advisory.fail_on_error = false;
        let runner = runner_with(vec![advisory, hook("second", "echo ok")]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert_eq!(results.len(), 2);
        assert!(results[0].failed());
        assert!(results[1].success());
        // The failure still registers as blocking for the caller's predicate.
        assert!(HookRunner::has_blocking_failure(&results));
    }

    #[tokio::test]
    async fn timeout_kills_the_hook_and_reports_124() {
        let mut slow = hook("slow", "sleep 5");
        slow.timeout = 1;
        let runner = runner_with(vec![slow]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("plan", false))
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].timed_out);
        assert_eq!(results[0].exit_code, TIMEOUT_EXIT_CODE);
        assert!(results[0].failed());
        assert!(results[0].stderr.contains("timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn skips_alone_are_not_blocking() {
        let mut h = hook("plan-check", "echo check");
        h.condition = HookCondition::PlanOnly;
        let runner = runner_with(vec![h]);
        let results = runner
            .run_phase(HookPhase::PrePlan, &context("apply", false))
            .await;
        assert!(!HookRunner::has_blocking_failure(&results));
    }
}
