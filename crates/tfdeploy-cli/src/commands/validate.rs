//! `validate` command: check the configuration file and print a summary

use std::path::Path;

use anyhow::Result;
use tfdeploy_config::load_config;

use crate::output;

pub fn run(config_path: &Path) -> Result<()> {
    output::print_info(&format!("Validating {}", config_path.display()));

    let config = load_config(config_path)?;
    output::print_success("Configuration is valid");

    output::print_setting("Environments", &config.environment_names().join(", "));
    output::print_setting("Default", &config.default_environment);
    output::print_setting("Production", &config.production_environments.join(", "));
    output::print_setting("Stable Branch", &config.stable_branch);

    if let Some(hooks) = &config.hooks {
        let count = hooks.pre_init.len()
            + hooks.post_init.len()
            + hooks.pre_plan.len()
            + hooks.post_plan.len()
            + hooks.post_apply.len();
        output::print_setting("Hooks", &count.to_string());
    }
    Ok(())
}
