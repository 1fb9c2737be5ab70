//! Terraform subprocess execution
//!
//! Runs `terraform init`, `plan`, and `apply` with resolved argument
//! vectors, interprets the `-detailed-exitcode` plan contract, and exposes
//! typed results rather than raw process exits:
//!
//! - Plan exit code 2 means "success with changes"; results normalize it to
//!   0 and set `has_changes` so callers never branch on the raw code.
//! - Non-zero exits are ordinary result values. `ExecutorError` is reserved
//!   for failures to launch a process at all.
//!
//! When tfcmt is installed and PR coordinates are supplied, plan and apply
//! are wrapped so the output is posted as a pull request comment.

mod error;
mod executor;
mod types;

pub use error::{ExecutorError, Result};
pub use executor::TerraformExecutor;
pub use types::{ApplyResult, CommandResult, PlanResult};
