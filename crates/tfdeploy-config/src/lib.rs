//! tfdeploy configuration
//!
//! Schema, loading, and argument resolution for `.tf-branch-deploy.yml`.
//!
//! # Overview
//!
//! The configuration file describes deployable environments, shared defaults,
//! lifecycle hooks, and hotfix handling. This crate owns three things:
//!
//! 1. **Schema** (`types`): strict serde models; unknown keys are rejected
//!    at parse time and scalar shorthand normalizes to lists.
//! 2. **Loading** (`loader`): file reading with distinct errors for missing,
//!    empty, malformed, and invalid configuration.
//! 3. **Resolution** (`resolver`): the inherit/override merge that produces
//!    the ordered argument vectors terraform is invoked with.
//!
//! # Configuration file shape
//!
//! ```yaml
//! default-environment: dev
//! production-environments: [prod]
//! stable-branch: main
//! defaults:
//!   var-files:
//!     paths: [common.tfvars]
//! environments:
//!   dev:
//!     var-files:
//!       paths: [dev.tfvars]
//!   prod:
//!     working-directory: infra/prod
//!     plan-args:
//!       inherit: false
//!       args: ["-parallelism=30"]
//! hooks:
//!   pre-plan:
//!     - name: lint
//!       run: tflint
//!       condition: plan-only
//!       fail-on-error: false
//! ```

pub mod error;
pub mod loader;
pub mod resolver;
pub mod types;

pub use error::{ConfigError, Result};
pub use loader::{load_config, DEFAULT_CONFIG_FILE};
pub use resolver::ArgCategory;
pub use types::{
    ArgsConfig, DefaultsConfig, DeployConfig, EnvironmentConfig, HookCondition, HookSpec,
    HooksConfig, HotfixConfig, HotfixDetectionConfig, HotfixSafetyConfig, PathsConfig,
};
