//! `execute` command: run terraform for an environment
//!
//! Assumes the comment-trigger step has already run; environment, operation,
//! and SHA arrive as flags and the remaining facts through `TF_BD_*` env.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tfdeploy_config::{load_config, ArgCategory, DeployConfig};
use tfdeploy_github::LifecycleManager;
use tracing::warn;

use crate::actions::set_output;
use crate::output;
use crate::pipeline::{DeployPipeline, Operation};

pub struct ExecuteArgs {
    pub environment: String,
    pub operation: Operation,
    pub sha: String,
    pub config_path: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub extra_args: Option<String>,
}

pub async fn run(args: ExecuteArgs) -> Result<()> {
    let config = load_config(&args.config_path)?;
    let env_config = config.get_environment(&args.environment)?;
    let working_directory = args
        .working_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&env_config.working_directory));

    let extra_args = parse_extra_args(args.extra_args.as_deref());
    if !extra_args.is_empty() {
        output::print_info(&format!("Extra args from command: {extra_args:?}"));
    }

    let short_sha: String = args.sha.chars().take(8).collect();
    output::print_setting("Environment", &args.environment);
    output::print_setting("Operation", args.operation.as_str());
    output::print_setting("SHA", &short_sha);
    output::print_setting("Working Dir", &working_directory.display().to_string());
    if args.dry_run {
        output::print_setting("Dry Run", "true");
    }

    let var_files = config.resolve(&args.environment, ArgCategory::VarFiles)?;
    set_output("working_directory", &working_directory.display().to_string());
    set_output("var_files", &serde_json::to_string(&var_files)?);
    set_output(
        "is_production",
        if config.is_production(&args.environment) { "true" } else { "false" },
    );

    if args.dry_run {
        print_dry_run(&config, &args, &extra_args, &working_directory)?;
        return Ok(());
    }

    let mut pipeline = DeployPipeline::new(
        config,
        args.environment.clone(),
        args.operation,
        args.sha.clone(),
        working_directory,
    );
    pipeline.extra_args = extra_args;

    let result = pipeline.run().await;
    finalize(&args, &result).await;

    match result {
        Ok(()) => {
            output::print_success("Terraform execution complete");
            Ok(())
        }
        Err(e) => {
            output::print_error(&e.to_string());
            Err(e)
        }
    }
}

fn parse_extra_args(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };
    match shell_words::split(raw) {
        Ok(args) => args,
        Err(e) => {
            warn!(error = %e, "Extra args are not valid shell syntax, splitting on whitespace");
            raw.split_whitespace().map(str::to_string).collect()
        }
    }
}

fn print_dry_run(
    config: &DeployConfig,
    args: &ExecuteArgs,
    extra_args: &[String],
    working_directory: &Path,
) -> Result<()> {
    let init_args = config.resolve(&args.environment, ArgCategory::InitArgs)?;
    let mut op_args = match args.operation {
        Operation::Plan => config.resolve(&args.environment, ArgCategory::PlanArgs)?,
        Operation::Apply => config.resolve(&args.environment, ArgCategory::ApplyArgs)?,
    };
    op_args.extend(extra_args.iter().cloned());

    output::print_warning("Dry run, commands would be:");
    println!("  cd {}", working_directory.display());
    println!("  terraform init {}", init_args.join(" "));
    println!(
        "  terraform {} {}",
        args.operation.as_str(),
        op_args.join(" ")
    );
    Ok(())
}

/// Report the outcome back to the pull request
///
/// Runs only when `GITHUB_REPOSITORY` is set. Every lifecycle call is
/// best-effort; the terraform exit status is what the workflow acts on.
async fn finalize(args: &ExecuteArgs, result: &Result<()>) {
    let Ok(repo) = std::env::var("GITHUB_REPOSITORY") else {
        return;
    };
    let manager = LifecycleManager::new(repo, std::env::var("GITHUB_TOKEN").ok());

    let env_vars: HashMap<String, String> = std::env::vars()
        .filter(|(k, _)| k.starts_with("TF_BD_"))
        .collect();
    let get = |key: &str| env_vars.get(key).cloned().unwrap_or_default();

    let (status, reaction) = match result {
        Ok(()) => ("success", "+1"),
        Err(_) => ("failure", "-1"),
    };
    let failure_reason = result.as_ref().err().map(|e| e.to_string());

    manager
        .update_deployment_status(&get("TF_BD_DEPLOYMENT_ID"), status, &args.environment)
        .await;

    let body = manager.format_result_comment(status, &env_vars, failure_reason.as_deref());
    manager.post_result_comment(&get("TF_BD_PR_NUMBER"), &body).await;

    let comment_id = get("TF_BD_COMMENT_ID");
    manager
        .remove_reaction(&comment_id, &get("TF_BD_REACTION_ID"))
        .await;
    manager.add_reaction(&comment_id, reaction).await;

    if result.is_ok() && args.operation == Operation::Apply {
        manager.remove_non_sticky_lock(&args.environment).await;
    }
}
