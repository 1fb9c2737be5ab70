//! Hook execution context and the `TF_BD_*` environment contract

use std::collections::HashMap;
use std::path::PathBuf;

use crate::phase::HookPhase;

/// Immutable snapshot of deployment facts for one phase transition
///
/// Constructed once per phase from the ambient deployment facts and handed
/// to every hook in that phase. [`HookContext::to_env`] serializes it to the
/// fixed `TF_BD_*` environment-variable vocabulary that user scripts consume;
/// the key names are an external wire format and must never change.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Phase the hooks are running in
    pub phase: HookPhase,

    /// Target deployment environment
    pub environment: String,

    /// Current operation: `plan`, `apply`, or `rollback`
    pub operation: String,

    /// Whether this deployment is a rollback from the stable branch
    pub is_rollback: bool,

    /// Git commit SHA being deployed
    pub sha: String,

    /// Git ref being deployed
    pub r#ref: String,

    /// GitHub actor who triggered the deployment
    pub actor: String,

    /// Pull request number, as a string
    pub pr_number: String,

    /// Raw extra parameters from the trigger comment
    pub params: String,

    /// Working directory terraform runs in
    pub working_dir: PathBuf,

    /// Whether the target environment is marked as production
    pub is_production: bool,

    /// Plan artifact file name; set only for the `post-plan` phase
    pub plan_file: Option<String>,

    /// Whether the plan reported changes; set only for the `post-plan` phase
    pub has_changes: Option<bool>,
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl HookContext {
    /// Serialize the context to `TF_BD_*` environment variables
    ///
    /// Pure and total: eleven keys are always present; `TF_BD_PLAN_FILE` and
    /// `TF_BD_HAS_CHANGES` appear only when the post-plan fields are set.
    /// When unset they are absent entirely, not present with an empty value,
    /// because downstream hooks use key presence to detect the phase. Booleans
    /// render as the literal lowercase strings `"true"` / `"false"`.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::from([
            ("TF_BD_PHASE".to_string(), self.phase.as_str().to_string()),
            ("TF_BD_ENVIRONMENT".to_string(), self.environment.clone()),
            ("TF_BD_OPERATION".to_string(), self.operation.clone()),
            (
                "TF_BD_IS_ROLLBACK".to_string(),
                bool_str(self.is_rollback).to_string(),
            ),
            ("TF_BD_SHA".to_string(), self.sha.clone()),
            ("TF_BD_REF".to_string(), self.r#ref.clone()),
            ("TF_BD_ACTOR".to_string(), self.actor.clone()),
            ("TF_BD_PR_NUMBER".to_string(), self.pr_number.clone()),
            ("TF_BD_PARAMS".to_string(), self.params.clone()),
            (
                "TF_BD_WORKING_DIR".to_string(),
                self.working_dir.display().to_string(),
            ),
            (
                "TF_BD_IS_PRODUCTION".to_string(),
                bool_str(self.is_production).to_string(),
            ),
        ]);

        if let Some(plan_file) = &self.plan_file {
            env.insert("TF_BD_PLAN_FILE".to_string(), plan_file.clone());
        }
        if let Some(has_changes) = self.has_changes {
            env.insert(
                "TF_BD_HAS_CHANGES".to_string(),
                bool_str(has_changes).to_string(),
            );
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(phase: HookPhase) -> HookContext {
        HookContext {
            phase,
            environment: "dev".to_string(),
            operation: "plan".to_string(),
            is_rollback: false,
            sha: "abc123def456".to_string(),
            r#ref: "feature/vpc".to_string(),
            actor: "octocat".to_string(),
            pr_number: "42".to_string(),
            params: "".to_string(),
            working_dir: PathBuf::from("infra"),
            is_production: false,
            plan_file: None,
            has_changes: None,
        }
    }

    #[test]
    fn base_vocabulary_is_always_present() {
        let env = context(HookPhase::PreInit).to_env();
        for key in [
            "TF_BD_PHASE",
            "TF_BD_ENVIRONMENT",
            "TF_BD_OPERATION",
            "TF_BD_IS_ROLLBACK",
            "TF_BD_SHA",
            "TF_BD_REF",
            "TF_BD_ACTOR",
            "TF_BD_PR_NUMBER",
            "TF_BD_PARAMS",
            "TF_BD_WORKING_DIR",
            "TF_BD_IS_PRODUCTION",
        ] {
            assert!(env.contains_key(key), "missing {key}");
        }
        assert_eq!(env.len(), 11);
        assert_eq!(env["TF_BD_PHASE"], "pre-init");
    }

    #[test]
    fn booleans_render_lowercase() {
        let mut ctx = context(HookPhase::PostApply);
        ctx.is_rollback = true;
        ctx.is_production = true;
        let env = ctx.to_env();
        assert_eq!(env["TF_BD_IS_ROLLBACK"], "true");
        assert_eq!(env["TF_BD_IS_PRODUCTION"], "true");

        let env = context(HookPhase::PreInit).to_env();
        assert_eq!(env["TF_BD_IS_ROLLBACK"], "false");
    }

    #[test]
    fn plan_keys_absent_when_unset() {
        let env = context(HookPhase::PrePlan).to_env();
        assert!(!env.contains_key("TF_BD_PLAN_FILE"));
        assert!(!env.contains_key("TF_BD_HAS_CHANGES"));
    }

    #[test]
    fn plan_keys_present_in_post_plan() {
        let mut ctx = context(HookPhase::PostPlan);
        ctx.plan_file = Some("tfplan-dev-abc123de.tfplan".to_string());
        ctx.has_changes = Some(true);
        let env = ctx.to_env();
        assert_eq!(env["TF_BD_PLAN_FILE"], "tfplan-dev-abc123de.tfplan");
        assert_eq!(env["TF_BD_HAS_CHANGES"], "true");
        assert_eq!(env.len(), 13);
    }
}
