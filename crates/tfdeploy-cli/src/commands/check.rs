//! `check` command: run a single built-in hook
//!
//! Lets workflows run the curated tool adapters (`validate`, `trivy`,
//! `tflint`) standalone, outside a full deployment. The markdown report is
//! exported as the `report` output so the workflow can post it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tfdeploy_config::load_config;
use tfdeploy_hooks::{
    BuiltinHook, HookContext, HookPhase, TerraformValidate, TflintCheck, TrivyScan,
};

use crate::actions::set_output;
use crate::output;
use crate::pipeline::DeployFacts;

pub async fn run(hook_name: &str, environment: &str, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let env_config = config.get_environment(environment)?;
    let working_dir = PathBuf::from(&env_config.working_directory);

    let hook = match hook_name {
        "validate" => BuiltinHook::Validate(TerraformValidate::new()),
        "trivy" => BuiltinHook::Trivy(TrivyScan::new()),
        "tflint" => BuiltinHook::Tflint(TflintCheck::new()),
        other => bail!("Unknown built-in hook: {other} (expected validate, trivy, or tflint)"),
    };

    if !hook.is_installed() {
        bail!("{} is not installed", hook.name());
    }

    let facts = DeployFacts::from_env();
    let context = HookContext {
        phase: HookPhase::PrePlan,
        environment: environment.to_string(),
        operation: "plan".to_string(),
        is_rollback: facts.is_rollback,
        sha: std::env::var("TF_BD_SHA").unwrap_or_default(),
        r#ref: facts.r#ref,
        actor: facts.actor,
        pr_number: facts.pr_number,
        params: facts.params,
        working_dir: working_dir.clone(),
        is_production: config.is_production(environment),
        plan_file: None,
        has_changes: None,
    };

    let result = hook.run(&context, &working_dir).await;
    set_output("report", &result.markdown);
    set_output("success", if result.success { "true" } else { "false" });

    if result.success {
        output::print_success(&result.summary);
        Ok(())
    } else {
        output::print_error(&result.summary);
        bail!("{} failed (exit code {})", hook.name(), result.exit_code);
    }
}
