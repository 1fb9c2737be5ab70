//! `parse` command: resolve settings without running terraform
//!
//! Used when a workflow needs configuration facts before invoking the
//! comment-trigger step itself. Emits everything as GitHub Actions outputs.

use std::path::Path;

use anyhow::Result;
use tfdeploy_config::{load_config, ArgCategory};

use crate::actions::set_output;
use crate::output;

pub fn run(environment: &str, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let env_config = config.get_environment(environment)?;

    let var_files = config.resolve(environment, ArgCategory::VarFiles)?;
    let backend_configs = config.resolve(environment, ArgCategory::BackendConfigs)?;
    let init_args = config.resolve(environment, ArgCategory::InitArgs)?;
    let plan_args = config.resolve(environment, ArgCategory::PlanArgs)?;
    let apply_args = config.resolve(environment, ArgCategory::ApplyArgs)?;

    set_output("working_directory", &env_config.working_directory);
    set_output("var_files", &serde_json::to_string(&var_files)?);
    set_output("backend_configs", &serde_json::to_string(&backend_configs)?);
    set_output("init_args", &serde_json::to_string(&init_args)?);
    set_output("plan_args", &serde_json::to_string(&plan_args)?);
    set_output("apply_args", &serde_json::to_string(&apply_args)?);
    set_output(
        "is_production",
        if config.is_production(environment) { "true" } else { "false" },
    );

    output::print_success(&format!("Parsed config for environment: {environment}"));
    Ok(())
}
