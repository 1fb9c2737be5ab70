//! Built-in hooks shipped with tfdeploy
//!
//! Curated adapters around well-known terraform tooling: `terraform validate`
//! (the only one enabled by default), `trivy`, and `tflint`. Each adapter is
//! a thin subprocess-and-parse-JSON wrapper producing the same structured
//! [`HookOutput`] contract, so the phase-sequencing logic is agnostic to
//! which kind it is running. The set is a closed enum, not open-ended
//! subclassing; user-defined shell hooks go through the [`crate::HookRunner`]
//! instead.

mod tflint;
mod trivy;
mod validate;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::context::HookContext;
use crate::result::TIMEOUT_EXIT_CODE;

pub use tflint::TflintCheck;
pub use trivy::TrivyScan;
pub use validate::TerraformValidate;

/// Which built-in hook this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// `terraform validate` (enabled by default)
    Validate,
    /// Trivy security scan
    Trivy,
    /// TFLint
    Tflint,
}

impl BuiltinKind {
    /// The configuration-file spelling of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinKind::Validate => "validate",
            BuiltinKind::Trivy => "trivy",
            BuiltinKind::Tflint => "tflint",
        }
    }
}

/// A single structured finding from a tool run
#[derive(Debug, Clone)]
pub struct Finding {
    /// Tool-reported severity, lowercased where the tool provides one
    pub severity: String,
    /// One-line description
    pub summary: String,
}

/// Structured output from a built-in hook
#[derive(Debug, Clone)]
pub struct HookOutput {
    /// Whether the tool passed
    pub success: bool,
    /// Tool exit code (124 on timeout)
    pub exit_code: i32,
    /// One-line summary for logs
    pub summary: String,
    /// Full markdown for a PR comment
    pub markdown: String,
    /// Structured findings, when the tool reports them
    pub findings: Vec<Finding>,
}

/// The closed set of built-in hooks
///
/// All variants share the one capability that matters to the runner:
/// `run(context, working_dir) -> HookOutput`.
#[derive(Debug, Clone)]
pub enum BuiltinHook {
    Validate(TerraformValidate),
    Trivy(TrivyScan),
    Tflint(TflintCheck),
}

impl BuiltinHook {
    /// Human-readable hook name
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinHook::Validate(_) => "Terraform Validate",
            BuiltinHook::Trivy(_) => "Trivy Security Scan",
            BuiltinHook::Tflint(_) => "TFLint",
        }
    }

    /// Which kind of built-in this is
    pub fn kind(&self) -> BuiltinKind {
        match self {
            BuiltinHook::Validate(_) => BuiltinKind::Validate,
            BuiltinHook::Trivy(_) => BuiltinKind::Trivy,
            BuiltinHook::Tflint(_) => BuiltinKind::Tflint,
        }
    }

    /// Whether the underlying tool is available on PATH
    pub fn is_installed(&self) -> bool {
        let binary = match self {
            BuiltinHook::Validate(_) => "terraform",
            BuiltinHook::Trivy(_) => "trivy",
            BuiltinHook::Tflint(_) => "tflint",
        };
        which::which(binary).is_ok()
    }

    /// Execute the hook and return structured output
    pub async fn run(&self, context: &HookContext, working_dir: &Path) -> HookOutput {
        match self {
            BuiltinHook::Validate(v) => v.run(context, working_dir).await,
            BuiltinHook::Trivy(t) => t.run(context, working_dir).await,
            BuiltinHook::Tflint(t) => t.run(context, working_dir).await,
        }
    }
}

/// Raw outcome of one tool invocation
pub(crate) struct ToolInvocation {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Run a tool with a timeout, converting every outcome to a value
pub(crate) async fn run_tool(
    program: &str,
    args: &[&str],
    working_dir: &Path,
    timeout_secs: u64,
) -> ToolInvocation {
    debug!(program = %program, args = ?args, cwd = %working_dir.display(), "Running built-in tool");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ToolInvocation {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("Failed to launch {program}: {e}"),
                timed_out: false,
            };
        }
    };

    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => ToolInvocation {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: false,
        },
        Ok(Err(e)) => ToolInvocation {
            exit_code: 1,
            stdout: String::new(),
            stderr: e.to_string(),
            timed_out: false,
        },
        Err(_) => ToolInvocation {
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: String::new(),
            stderr: format!("{program} timed out after {timeout_secs} seconds"),
            timed_out: true,
        },
    }
}
