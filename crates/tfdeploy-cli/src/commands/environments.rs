//! `environments` command: list environment names
//!
//! Output is a bare comma-separated list, consumed directly by the
//! comment-trigger step's environment allowlist input.

use std::path::Path;

use anyhow::Result;
use tfdeploy_config::load_config;

pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", config.environment_names().join(","));
    Ok(())
}
