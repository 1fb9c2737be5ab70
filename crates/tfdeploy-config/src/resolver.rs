//! Argument resolution with inherit/override semantics
//!
//! Resolution is a pure function over the validated configuration tree:
//! result = defaults list (when this environment inherits the category)
//! followed by the environment-specific list. Order is significant and
//! preserved; nothing is deduplicated or reordered.

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::{ArgsConfig, DeployConfig, EnvironmentConfig, PathsConfig};

/// The five resolvable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCategory {
    VarFiles,
    BackendConfigs,
    InitArgs,
    PlanArgs,
    ApplyArgs,
}

impl ArgCategory {
    /// The configuration-file spelling of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgCategory::VarFiles => "var-files",
            ArgCategory::BackendConfigs => "backend-configs",
            ArgCategory::InitArgs => "init-args",
            ArgCategory::PlanArgs => "plan-args",
            ArgCategory::ApplyArgs => "apply-args",
        }
    }
}

/// A category's inherit flag and item list, viewed uniformly
struct CategoryView<'a> {
    inherit: bool,
    items: &'a [String],
}

fn view_paths(cfg: &PathsConfig) -> CategoryView<'_> {
    CategoryView {
        inherit: cfg.inherit,
        items: &cfg.paths,
    }
}

fn view_args(cfg: &ArgsConfig) -> CategoryView<'_> {
    CategoryView {
        inherit: cfg.inherit,
        items: &cfg.args,
    }
}

fn env_category<'a>(env: &'a EnvironmentConfig, category: ArgCategory) -> Option<CategoryView<'a>> {
    match category {
        ArgCategory::VarFiles => env.var_files.as_ref().map(view_paths),
        ArgCategory::BackendConfigs => env.backend_configs.as_ref().map(view_paths),
        ArgCategory::InitArgs => env.init_args.as_ref().map(view_args),
        ArgCategory::PlanArgs => env.plan_args.as_ref().map(view_args),
        ArgCategory::ApplyArgs => env.apply_args.as_ref().map(view_args),
    }
}

impl DeployConfig {
    /// Validate that every environment reference resolves
    ///
    /// Checks `default-environment` and every entry of
    /// `production-environments` against the `environments` map, and rejects
    /// an empty map. Called by the loader; violations never survive past load
    /// time.
    pub fn validate(&self) -> Result<()> {
        if self.environments.is_empty() {
            return Err(ConfigError::Validation(
                "environments map must not be empty".to_string(),
            ));
        }

        if !self.environments.contains_key(&self.default_environment) {
            return Err(ConfigError::UnknownEnvironment {
                kind: "default-environment",
                name: self.default_environment.clone(),
                available: self.environment_names(),
            });
        }

        for prod_env in &self.production_environments {
            if !self.environments.contains_key(prod_env) {
                return Err(ConfigError::UnknownEnvironment {
                    kind: "production-environment",
                    name: prod_env.clone(),
                    available: self.environment_names(),
                });
            }
        }

        Ok(())
    }

    /// Sorted list of defined environment names
    pub fn environment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.environments.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up an environment, with a descriptive error when it is unknown
    pub fn get_environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                kind: "environment",
                name: name.to_string(),
                available: self.environment_names(),
            })
    }

    /// Whether an environment is marked as production
    pub fn is_production(&self, environment: &str) -> bool {
        self.production_environments
            .iter()
            .any(|e| e == environment)
    }

    /// Resolve one category for one environment
    ///
    /// Determinism: two calls with the same configuration yield the same
    /// output. No side effects, no ambient environment reads.
    pub fn resolve(&self, environment: &str, category: ArgCategory) -> Result<Vec<String>> {
        let env_config = self.get_environment(environment)?;
        let env_view = env_category(env_config, category);

        // inherit defaults to true when the environment does not specify the
        // category at all; otherwise the category's own flag governs
        let should_inherit = env_view.as_ref().map(|v| v.inherit).unwrap_or(true);

        let mut result: Vec<String> = Vec::new();

        if should_inherit {
            if let Some(defaults) = &self.defaults {
                let default_view = match category {
                    ArgCategory::VarFiles => defaults.var_files.as_ref().map(view_paths),
                    ArgCategory::BackendConfigs => {
                        defaults.backend_configs.as_ref().map(view_paths)
                    }
                    ArgCategory::InitArgs => defaults.init_args.as_ref().map(view_args),
                    ArgCategory::PlanArgs => defaults.plan_args.as_ref().map(view_args),
                    ArgCategory::ApplyArgs => defaults.apply_args.as_ref().map(view_args),
                };
                if let Some(view) = default_view {
                    result.extend(view.items.iter().cloned());
                }
            }
        }

        if let Some(view) = env_view {
            result.extend(view.items.iter().cloned());
        }

        debug!(
            environment = %environment,
            category = category.as_str(),
            count = result.len(),
            "Resolved argument list"
        );

        Ok(result)
    }
}
