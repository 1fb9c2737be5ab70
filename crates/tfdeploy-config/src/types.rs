//! Configuration schema for `.tf-branch-deploy.yml`
//!
//! These types are the source of truth for the configuration file shape.
//! The schema is strict: unknown top-level keys are rejected at parse time
//! rather than silently ignored, so a typo in a key name fails loudly.

use std::collections::HashMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Accept either a single scalar string or a list of strings.
///
/// The configuration file allows `var-files: common.tfvars` as shorthand for
/// a one-element list; `null` normalizes to an empty list.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(OneOrMany::One(s)) => Ok(vec![s]),
        Some(OneOrMany::Many(v)) => Ok(v),
    }
}

fn default_true() -> bool {
    true
}

fn default_working_directory() -> String {
    ".".to_string()
}

fn default_stable_branch() -> String {
    "main".to_string()
}

/// Command-line argument list (`init-args`, `plan-args`, `apply-args`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArgsConfig {
    /// Whether the defaults-level list is prepended to this one
    #[serde(default = "default_true")]
    pub inherit: bool,

    /// Argument strings, in the order they will be passed to terraform
    #[serde(default, deserialize_with = "string_or_seq")]
    pub args: Vec<String>,
}

/// File path list (`var-files`, `backend-configs`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Whether the defaults-level list is prepended to this one
    #[serde(default = "default_true")]
    pub inherit: bool,

    /// Paths, relative to the environment's working directory
    #[serde(default, deserialize_with = "string_or_seq")]
    pub paths: Vec<String>,
}

/// Defaults inherited by every environment unless it opts out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default, rename = "var-files")]
    pub var_files: Option<PathsConfig>,

    #[serde(default, rename = "backend-configs")]
    pub backend_configs: Option<PathsConfig>,

    #[serde(default, rename = "init-args")]
    pub init_args: Option<ArgsConfig>,

    #[serde(default, rename = "plan-args")]
    pub plan_args: Option<ArgsConfig>,

    #[serde(default, rename = "apply-args")]
    pub apply_args: Option<ArgsConfig>,
}

/// Per-environment deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Directory terraform runs in, relative to the repository root
    #[serde(default = "default_working_directory", rename = "working-directory")]
    pub working_directory: String,

    #[serde(default, rename = "var-files")]
    pub var_files: Option<PathsConfig>,

    #[serde(default, rename = "backend-configs")]
    pub backend_configs: Option<PathsConfig>,

    #[serde(default, rename = "init-args")]
    pub init_args: Option<ArgsConfig>,

    #[serde(default, rename = "plan-args")]
    pub plan_args: Option<ArgsConfig>,

    #[serde(default, rename = "apply-args")]
    pub apply_args: Option<ArgsConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            working_directory: default_working_directory(),
            var_files: None,
            backend_configs: None,
            init_args: None,
            plan_args: None,
            apply_args: None,
        }
    }
}

/// When a lifecycle hook is eligible to run
///
/// Evaluated against the current operation and rollback flag. An unrecognized
/// condition string is preserved and fails OPEN (the hook runs). That is a
/// deliberate policy, not an accident; the tests pin it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCondition {
    /// Run for every operation
    Always,
    /// Run only when the operation is `plan`
    PlanOnly,
    /// Run when the operation is `apply` or `rollback` (rollback is apply-shaped)
    ApplyOnly,
    /// Run only when the deployment is a rollback
    RollbackOnly,
    /// Unrecognized condition string; treated as `always`
    Unrecognized(String),
}

impl HookCondition {
    /// Whether a hook with this condition should run for the given operation
    pub fn should_run(&self, operation: &str, is_rollback: bool) -> bool {
        match self {
            HookCondition::Always => true,
            HookCondition::PlanOnly => operation == "plan",
            HookCondition::ApplyOnly => operation == "apply" || operation == "rollback",
            HookCondition::RollbackOnly => is_rollback,
            HookCondition::Unrecognized(_) => true,
        }
    }

    /// The configuration-file spelling of this condition
    pub fn as_str(&self) -> &str {
        match self {
            HookCondition::Always => "always",
            HookCondition::PlanOnly => "plan-only",
            HookCondition::ApplyOnly => "apply-only",
            HookCondition::RollbackOnly => "rollback-only",
            HookCondition::Unrecognized(s) => s,
        }
    }
}

impl Default for HookCondition {
    fn default() -> Self {
        HookCondition::Always
    }
}

impl fmt::Display for HookCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HookCondition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HookCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "always" => HookCondition::Always,
            "plan-only" => HookCondition::PlanOnly,
            "apply-only" => HookCondition::ApplyOnly,
            "rollback-only" => HookCondition::RollbackOnly,
            _ => HookCondition::Unrecognized(s),
        })
    }
}

fn default_hook_timeout() -> u64 {
    600
}

/// A user-defined lifecycle hook
///
/// Defined statically in configuration and instantiated fresh per invocation;
/// never mutated between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookSpec {
    /// Human-readable name, used in logs and failure reports
    pub name: String,

    /// Shell command to execute
    pub run: String,

    /// Eligibility filter evaluated against the current operation
    #[serde(default)]
    pub condition: HookCondition,

    /// Whether a failure of this hook blocks the rest of the pipeline
    #[serde(default = "default_true", rename = "fail-on-error")]
    pub fail_on_error: bool,

    /// Timeout in seconds before the hook process is killed
    #[serde(default = "default_hook_timeout")]
    pub timeout: u64,

    /// Extra environment variables, overriding the injected context on conflict
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,

    /// Working directory override for this hook only
    #[serde(default, rename = "working-directory")]
    pub working_directory: Option<String>,
}

/// Hooks grouped by the phase they run in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HooksConfig {
    #[serde(default, rename = "pre-init")]
    pub pre_init: Vec<HookSpec>,

    #[serde(default, rename = "post-init")]
    pub post_init: Vec<HookSpec>,

    #[serde(default, rename = "pre-plan")]
    pub pre_plan: Vec<HookSpec>,

    #[serde(default, rename = "post-plan")]
    pub post_plan: Vec<HookSpec>,

    #[serde(default, rename = "post-apply")]
    pub post_apply: Vec<HookSpec>,
}

fn default_branch_pattern() -> String {
    "hotfix/*".to_string()
}

fn default_confirmation_command() -> String {
    ".confirm-hotfix".to_string()
}

/// How hotfix PRs are detected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotfixDetectionConfig {
    /// Glob matched against the PR head branch
    #[serde(default = "default_branch_pattern", rename = "branch-pattern")]
    pub branch_pattern: String,

    /// Whether the PR must target the stable branch to count as a hotfix
    #[serde(default = "default_true", rename = "targets-stable-branch")]
    pub targets_stable_branch: bool,
}

impl Default for HotfixDetectionConfig {
    fn default() -> Self {
        Self {
            branch_pattern: default_branch_pattern(),
            targets_stable_branch: true,
        }
    }
}

/// Safety gates applied to hotfix deployments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotfixSafetyConfig {
    #[serde(default = "default_true")]
    pub require_confirmation: bool,

    #[serde(default = "default_confirmation_command")]
    pub confirmation_command: String,

    #[serde(default = "default_true")]
    pub require_approval: bool,

    #[serde(default = "default_true")]
    pub require_ci_pass: bool,
}

impl Default for HotfixSafetyConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
            confirmation_command: default_confirmation_command(),
            require_approval: true,
            require_ci_pass: true,
        }
    }
}

/// Hotfix workflow handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotfixConfig {
    #[serde(default)]
    pub detection: HotfixDetectionConfig,

    #[serde(default)]
    pub safety: HotfixSafetyConfig,
}

/// Root configuration for `.tf-branch-deploy.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Environment used when a comment does not name one
    #[serde(rename = "default-environment")]
    pub default_environment: String,

    /// Environments that require production safeguards
    #[serde(rename = "production-environments", deserialize_with = "string_or_seq")]
    pub production_environments: Vec<String>,

    /// All deployable environments, keyed by name
    pub environments: HashMap<String, EnvironmentConfig>,

    /// Settings inherited by every environment
    #[serde(default)]
    pub defaults: Option<DefaultsConfig>,

    /// Lifecycle hooks, grouped by phase
    #[serde(default)]
    pub hooks: Option<HooksConfig>,

    /// Hotfix workflow handling
    #[serde(default)]
    pub hotfix: Option<HotfixConfig>,

    /// Branch that rollbacks deploy from
    #[serde(default = "default_stable_branch", rename = "stable-branch")]
    pub stable_branch: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_string_normalizes_to_one_element_list() {
        let cfg: PathsConfig = serde_yaml::from_str("paths: common.tfvars").unwrap();
        assert_eq!(cfg.paths, vec!["common.tfvars"]);
        assert!(cfg.inherit);
    }

    #[test]
    fn null_items_normalize_to_empty_list() {
        let cfg: ArgsConfig = serde_yaml::from_str("args: null").unwrap();
        assert!(cfg.args.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<EnvironmentConfig, _> =
            serde_yaml::from_str("working-directory: infra\nvarr-files:\n  paths: [a]\n");
        assert!(result.is_err());
    }

    #[test]
    fn production_environments_accepts_scalar() {
        let yaml = r#"
default-environment: dev
production-environments: prod
environments:
  dev: {}
  prod: {}
"#;
        let cfg: DeployConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.production_environments, vec!["prod"]);
        assert_eq!(cfg.stable_branch, "main");
    }

    #[test]
    fn hook_defaults() {
        let spec: HookSpec =
            serde_yaml::from_str("name: lint\nrun: tflint\n").unwrap();
        assert_eq!(spec.condition, HookCondition::Always);
        assert!(spec.fail_on_error);
        assert_eq!(spec.timeout, 600);
        assert!(spec.env.is_none());
        assert!(spec.working_directory.is_none());
    }

    #[test]
    fn unrecognized_condition_is_preserved_and_fails_open() {
        let spec: HookSpec =
            serde_yaml::from_str("name: x\nrun: \"true\"\ncondition: weekends-only\n").unwrap();
        assert_eq!(
            spec.condition,
            HookCondition::Unrecognized("weekends-only".to_string())
        );
        // Fail-open is a documented policy choice: an unknown condition runs.
        assert!(spec.condition.should_run("plan", false));
        assert!(spec.condition.should_run("apply", false));
    }

    #[test]
    fn hotfix_block_fills_defaults() {
        let cfg: HotfixConfig = serde_yaml::from_str("detection:\n  branch-pattern: \"fix/*\"\n").unwrap();
        assert_eq!(cfg.detection.branch_pattern, "fix/*");
        assert!(cfg.detection.targets_stable_branch);
        assert!(cfg.safety.require_confirmation);
        assert_eq!(cfg.safety.confirmation_command, ".confirm-hotfix");
        assert!(cfg.safety.require_ci_pass);
    }

    #[test]
    fn condition_matrix() {
        let cases: &[(HookCondition, &str, bool, bool)] = &[
            (HookCondition::Always, "plan", false, true),
            (HookCondition::Always, "apply", false, true),
            (HookCondition::Always, "rollback", true, true),
            (HookCondition::PlanOnly, "plan", false, true),
            (HookCondition::PlanOnly, "apply", false, false),
            (HookCondition::PlanOnly, "rollback", true, false),
            (HookCondition::ApplyOnly, "plan", false, false),
            (HookCondition::ApplyOnly, "apply", false, true),
            (HookCondition::ApplyOnly, "rollback", true, true),
            (HookCondition::RollbackOnly, "plan", false, false),
            (HookCondition::RollbackOnly, "apply", false, false),
            (HookCondition::RollbackOnly, "rollback", true, true),
        ];
        for (condition, operation, is_rollback, expected) in cases {
            assert_eq!(
                condition.should_run(operation, *is_rollback),
                *expected,
                "condition={condition} operation={operation} is_rollback={is_rollback}"
            );
        }
    }
}
