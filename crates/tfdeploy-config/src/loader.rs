//! Configuration file loading
//!
//! Loads and validates `.tf-branch-deploy.yml`. Missing file, empty file,
//! parse failure and reference-validation failure are distinct errors so the
//! CLI can report each with the right guidance.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::DeployConfig;

/// Default configuration file name, looked up in the repository root
pub const DEFAULT_CONFIG_FILE: &str = ".tf-branch-deploy.yml";

/// Load and validate configuration from a YAML file
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }

    let config: DeployConfig = serde_yaml::from_str(&content)?;
    config.validate()?;

    debug!(
        path = %path.display(),
        environments = config.environments.len(),
        "Loaded configuration"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_config() {
        let file = write_config(
            r#"
default-environment: dev
production-environments: [prod]
environments:
  dev: {}
  prod:
    working-directory: infra
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.default_environment, "dev");
        assert_eq!(
            config.environments["prod"].working_directory,
            "infra"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_config(Path::new("/nonexistent/.tf-branch-deploy.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = write_config("\n  \n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn invalid_reference_fails_at_load_time() {
        let file = write_config(
            r#"
default-environment: ghost
production-environments: []
environments:
  dev: {}
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("not defined in environments"));
    }

    #[test]
    fn unknown_top_level_key_fails_at_load_time() {
        let file = write_config(
            r#"
default-environment: dev
production-environments: []
environments:
  dev: {}
stable_branch: main
"#,
        );
        // Only the kebab-case spelling is accepted.
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }
}
