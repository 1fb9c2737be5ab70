//! Deployment pipeline
//!
//! Sequences one deployment attempt: pre-init hooks, terraform init,
//! post-init hooks, pre-plan hooks, then plan or apply, then the matching
//! post phase. Any blocking point that fails aborts the remainder, and the
//! reported failure names the phase and, for hooks, the blocking hook.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use tfdeploy_artifacts::{artifact_name, verify_plan, PlanArtifact, PlanIntegrity};
use tfdeploy_config::{ArgCategory, DeployConfig, HookSpec};
use tfdeploy_executor::TerraformExecutor;
use tfdeploy_hooks::{HookContext, HookPhase, HookResult, HookRunner};
use tracing::{info, warn};

use crate::actions::set_output;
use crate::output;

/// Terraform operation being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Operation {
    Plan,
    Apply,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Plan => "plan",
            Operation::Apply => "apply",
        }
    }
}

/// Deployment facts delivered by the comment-trigger collaborator
///
/// The trigger tool runs upstream and hands these over through the
/// environment; the pipeline never parses PR comments itself.
#[derive(Debug, Clone, Default)]
pub struct DeployFacts {
    pub r#ref: String,
    pub actor: String,
    pub pr_number: String,
    pub params: String,
    pub is_rollback: bool,
    /// Checksum recorded when the plan was produced; enables tamper detection
    pub plan_checksum: Option<String>,
}

impl DeployFacts {
    /// Gather facts from the `TF_BD_*` environment
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).unwrap_or_default();
        Self {
            r#ref: get("TF_BD_REF"),
            actor: get("TF_BD_ACTOR"),
            pr_number: get("TF_BD_PR_NUMBER"),
            params: get("TF_BD_PARAMS"),
            is_rollback: get("TF_BD_IS_ROLLBACK").eq_ignore_ascii_case("true"),
            plan_checksum: std::env::var("TF_BD_PLAN_CHECKSUM").ok().filter(|s| !s.is_empty()),
        }
    }
}

/// One deployment attempt for a resolved environment
pub struct DeployPipeline {
    pub config: DeployConfig,
    pub environment: String,
    pub operation: Operation,
    pub sha: String,
    pub working_directory: PathBuf,
    /// Extra terraform arguments from the trigger comment, appended last
    pub extra_args: Vec<String>,
    pub facts: DeployFacts,
    /// Terraform binary; overridable for tests
    pub binary: String,
    pub use_tfcmt: bool,
}

impl DeployPipeline {
    pub fn new(
        config: DeployConfig,
        environment: String,
        operation: Operation,
        sha: String,
        working_directory: PathBuf,
    ) -> Self {
        Self {
            config,
            environment,
            operation,
            sha,
            working_directory,
            extra_args: Vec::new(),
            facts: DeployFacts::from_env(),
            binary: "terraform".to_string(),
            use_tfcmt: true,
        }
    }

    /// Run the full pipeline
    pub async fn run(&self) -> Result<()> {
        let executor = self.build_executor()?;
        let runner = HookRunner::new(self.config.hooks.clone(), self.working_directory.clone());

        self.run_hook_phase(&runner, HookPhase::PreInit, None).await?;

        let init = executor.init().await?;
        if !init.success() {
            bail!(
                "Terraform init failed in environment '{}' (exit code {})",
                self.environment,
                init.exit_code
            );
        }

        self.run_hook_phase(&runner, HookPhase::PostInit, None).await?;
        self.run_hook_phase(&runner, HookPhase::PrePlan, None).await?;

        match self.operation {
            Operation::Plan => self.run_plan(&executor, &runner).await,
            Operation::Apply => self.run_apply(&executor, &runner).await,
        }
    }

    async fn run_plan(&self, executor: &TerraformExecutor, runner: &HookRunner) -> Result<()> {
        // Filename only; terraform resolves it against its working directory.
        let plan_name = artifact_name(&self.environment, &self.sha);
        let result = executor.plan(std::path::Path::new(&plan_name)).await?;

        if let (Some(path), Some(checksum)) = (&result.plan_file, &result.checksum) {
            let artifact = PlanArtifact {
                environment: self.environment.clone(),
                sha: self.sha.clone(),
                checksum: checksum.clone(),
                path: path.clone(),
            };
            info!(
                path = %artifact.path.display(),
                checksum = %artifact.checksum,
                "Plan artifact recorded"
            );
            set_output("plan_file", &artifact.file_name());
            set_output("plan_checksum", &artifact.checksum);
            set_output("has_changes", if result.has_changes { "true" } else { "false" });
        }

        if !result.success() {
            bail!(
                "Terraform plan failed in environment '{}' (exit code {})",
                self.environment,
                result.exit_code
            );
        }

        if result.has_changes {
            output::print_info("Plan has changes");
        } else {
            output::print_info("Plan has no changes");
        }

        let post_plan = (Some(plan_name), Some(result.has_changes));
        self.run_hook_phase(runner, HookPhase::PostPlan, Some(post_plan))
            .await
    }

    async fn run_apply(&self, executor: &TerraformExecutor, runner: &HookRunner) -> Result<()> {
        let plan_name = artifact_name(&self.environment, &self.sha);
        let plan_path = self.working_directory.join(&plan_name);

        let plan_file = if let Some(expected) = &self.facts.plan_checksum {
            match verify_plan(&plan_path, expected)? {
                PlanIntegrity::Verified => {
                    output::print_success("Plan checksum verified");
                    Some(plan_name.clone())
                }
                PlanIntegrity::Mismatch { expected, actual } => {
                    bail!(
                        "Plan file checksum mismatch for '{plan_name}': expected {expected}, got {actual}. \
                         The plan may have been tampered with; refusing to apply."
                    );
                }
                PlanIntegrity::Missing => self.missing_plan(&plan_name)?,
            }
        } else if plan_path.exists() {
            info!(plan_file = %plan_name, "Found plan file");
            Some(plan_name.clone())
        } else {
            self.missing_plan(&plan_name)?
        };

        let result = executor
            .apply(plan_file.as_deref().map(std::path::Path::new))
            .await?;
        if !result.success() {
            bail!(
                "Terraform apply failed in environment '{}' (exit code {})",
                self.environment,
                result.exit_code
            );
        }

        // The artifact stays on disk; re-applying the same commit reuses it.
        self.run_hook_phase(runner, HookPhase::PostApply, None).await
    }

    /// Decide what a missing plan artifact means for this apply
    ///
    /// A rollback deploys the stable branch directly and never has a plan.
    /// Anything else must plan first.
    fn missing_plan(&self, plan_name: &str) -> Result<Option<String>> {
        if self.facts.is_rollback {
            warn!("Rollback detected, applying directly from stable branch");
            Ok(None)
        } else {
            Err(anyhow!(
                "No plan file found for this SHA: {plan_name}. \
                 Run '.plan to {env}' before '.apply to {env}'. \
                 For rollback, use '.apply {stable} to {env}'.",
                env = self.environment,
                stable = self.config.stable_branch,
            ))
        }
    }

    async fn run_hook_phase(
        &self,
        runner: &HookRunner,
        phase: HookPhase,
        post_plan: Option<(Option<String>, Option<bool>)>,
    ) -> Result<()> {
        let mut context = self.hook_context(phase);
        if let Some((plan_file, has_changes)) = post_plan {
            context.plan_file = plan_file;
            context.has_changes = has_changes;
        }

        let results = runner.run_phase(phase, &context).await;
        if let Some(blocked) = self.blocking_failure(phase, &results) {
            bail!(
                "Hook '{}' failed in phase '{}' (exit code {})",
                blocked.name,
                phase,
                blocked.exit_code
            );
        }
        Ok(())
    }

    /// Find the failure that blocks the pipeline, if any
    ///
    /// Only a failed hook whose spec has `fail-on-error: true` aborts the
    /// remaining phases; non-blocking failures were already logged by the
    /// runner and the pipeline proceeds past them.
    fn blocking_failure<'a>(
        &self,
        phase: HookPhase,
        results: &'a [HookResult],
    ) -> Option<&'a HookResult> {
        let specs = self.phase_specs(phase);
        results.iter().find(|result| {
            result.failed()
                && specs
                    .iter()
                    .any(|spec| spec.name == result.name && spec.fail_on_error)
        })
    }

    fn phase_specs(&self, phase: HookPhase) -> &[HookSpec] {
        let Some(hooks) = &self.config.hooks else {
            return &[];
        };
        match phase {
            HookPhase::PreInit => &hooks.pre_init,
            HookPhase::PostInit => &hooks.post_init,
            HookPhase::PrePlan => &hooks.pre_plan,
            HookPhase::PostPlan => &hooks.post_plan,
            HookPhase::PostApply => &hooks.post_apply,
        }
    }

    fn hook_context(&self, phase: HookPhase) -> HookContext {
        HookContext {
            phase,
            environment: self.environment.clone(),
            operation: self.operation.as_str().to_string(),
            is_rollback: self.facts.is_rollback,
            sha: self.sha.clone(),
            r#ref: self.facts.r#ref.clone(),
            actor: self.facts.actor.clone(),
            pr_number: self.facts.pr_number.clone(),
            params: self.facts.params.clone(),
            working_dir: self.working_directory.clone(),
            is_production: self.config.is_production(&self.environment),
            plan_file: None,
            has_changes: None,
        }
    }

    fn build_executor(&self) -> Result<TerraformExecutor> {
        let resolve = |category| self.config.resolve(&self.environment, category);

        let mut plan_args = resolve(ArgCategory::PlanArgs)?;
        plan_args.extend(self.extra_args.iter().cloned());
        let mut apply_args = resolve(ArgCategory::ApplyArgs)?;
        apply_args.extend(self.extra_args.iter().cloned());

        Ok(TerraformExecutor {
            working_directory: self.working_directory.clone(),
            var_files: resolve(ArgCategory::VarFiles)?,
            backend_configs: resolve(ArgCategory::BackendConfigs)?,
            init_args: resolve(ArgCategory::InitArgs)?,
            plan_args,
            apply_args,
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            repo: std::env::var("GITHUB_REPOSITORY").ok(),
            pr_number: self.facts.pr_number.parse().ok(),
            use_tfcmt: self.use_tfcmt,
            binary: self.binary.clone(),
        })
    }
}
