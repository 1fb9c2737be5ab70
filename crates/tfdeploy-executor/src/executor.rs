//! Terraform executor
//!
//! Orchestrates `init`, `plan`, and `apply` subprocess invocations over the
//! argument vectors the resolver produced, and interprets terraform's
//! three-way plan exit-code contract (0 = no changes, 2 = changes, anything
//! else = failure). Plan output is tied to the artifact manager: a checksum
//! is computed whenever the plan binary exists after the run.
//!
//! The executor never posts comments or manages reactions; user notification
//! is delegated to the caller and, when available, to tfcmt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tfdeploy_artifacts::calculate_checksum;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExecutorError, Result};
use crate::types::{ApplyResult, CommandResult, PlanResult};

const TF_INPUT_FALSE: &str = "-input=false";

/// Executes terraform operations for one resolved environment
#[derive(Debug, Clone)]
pub struct TerraformExecutor {
    /// Directory terraform runs in
    pub working_directory: PathBuf,

    /// Resolved var-file paths, passed to plan (and direct apply)
    pub var_files: Vec<String>,

    /// Resolved backend-config paths, passed to init
    pub backend_configs: Vec<String>,

    /// Resolved extra init arguments
    pub init_args: Vec<String>,

    /// Resolved extra plan arguments (dynamic extras already appended last)
    pub plan_args: Vec<String>,

    /// Resolved extra apply arguments (used only for direct apply)
    pub apply_args: Vec<String>,

    /// GitHub token for tfcmt comment posting
    pub github_token: Option<String>,

    /// Repository in `owner/name` form, for tfcmt
    pub repo: Option<String>,

    /// Pull request number, for tfcmt
    pub pr_number: Option<u64>,

    /// Whether to wrap plan/apply with tfcmt when it is available
    pub use_tfcmt: bool,

    /// Terraform binary to invoke; injectable so the exit-code contract is
    /// testable without terraform installed
    pub binary: String,
}

impl TerraformExecutor {
    /// Create an executor with empty argument lists
    pub fn new(working_directory: PathBuf) -> Self {
        Self {
            working_directory,
            var_files: Vec::new(),
            backend_configs: Vec::new(),
            init_args: Vec::new(),
            plan_args: Vec::new(),
            apply_args: Vec::new(),
            github_token: None,
            repo: None,
            pr_number: None,
            use_tfcmt: true,
            binary: "terraform".to_string(),
        }
    }

    /// Run `terraform init`
    ///
    /// Failure here is always fatal to the remaining pipeline; the caller
    /// must not attempt plan or apply after a failed init.
    pub async fn init(&self) -> Result<CommandResult> {
        info!(working_directory = %self.working_directory.display(), "Terraform init");

        let mut args = vec![
            self.binary.clone(),
            "init".to_string(),
            TF_INPUT_FALSE.to_string(),
        ];
        for backend in &self.backend_configs {
            args.push("-backend-config".to_string());
            args.push(backend.clone());
        }
        args.extend(self.init_args.iter().cloned());

        let result = self.run_command(&args, None).await?;
        if result.success() {
            debug!("Init successful");
        } else {
            warn!(exit_code = result.exit_code, "Init failed");
        }
        Ok(result)
    }

    /// Run `terraform plan` and checksum the produced artifact
    ///
    /// Exit-code contract: 0 = success with no changes, 2 = success with
    /// changes, anything else = failure. The checksum is computed whenever
    /// `out_file` exists after the run, regardless of the exit
    /// classification; a failed plan may still have produced a file, and
    /// the caller decides whether to trust it.
    pub async fn plan(&self, out_file: &Path) -> Result<PlanResult> {
        info!(
            working_directory = %self.working_directory.display(),
            out_file = %out_file.display(),
            "Terraform plan"
        );

        let mut args = vec![
            self.binary.clone(),
            "plan".to_string(),
            TF_INPUT_FALSE.to_string(),
            "-detailed-exitcode".to_string(),
        ];
        for var_file in &self.var_files {
            args.push("-var-file".to_string());
            args.push(var_file.clone());
        }
        args.push("-out".to_string());
        args.push(out_file.display().to_string());
        args.extend(self.plan_args.iter().cloned());

        let result = self.run_wrapped("plan", &args).await?;

        let has_changes = result.exit_code == 2;
        let success = result.exit_code == 0 || result.exit_code == 2;
        if success {
            debug!(has_changes, "Plan successful");
        } else {
            warn!(exit_code = result.exit_code, "Plan failed");
        }

        // Terraform writes the plan relative to its working directory.
        let artifact_path = self.resolve_in_workdir(out_file);
        let (plan_file, checksum) = if artifact_path.exists() {
            let checksum = match calculate_checksum(&artifact_path) {
                Ok(checksum) => Some(checksum),
                Err(e) => {
                    warn!(path = %artifact_path.display(), error = %e, "Failed to checksum plan file");
                    None
                }
            };
            (Some(artifact_path), checksum)
        } else {
            (None, None)
        };

        Ok(PlanResult {
            exit_code: if success { 0 } else { result.exit_code },
            stdout: result.stdout,
            stderr: result.stderr,
            command: result.command,
            has_changes,
            plan_file,
            checksum,
        })
    }

    /// Run `terraform apply`
    ///
    /// With an existing plan file, the plan is applied bare: no var-files,
    /// no extra apply arguments. The plan already encodes the intended
    /// changes; re-supplying variables could drift from what was planned.
    /// Without a plan file (the rollback path), a direct apply uses the
    /// resolved var-files and apply arguments.
    pub async fn apply(&self, plan_file: Option<&Path>) -> Result<ApplyResult> {
        info!(
            working_directory = %self.working_directory.display(),
            plan_file = ?plan_file,
            "Terraform apply"
        );

        let mut args = vec![
            self.binary.clone(),
            "apply".to_string(),
            TF_INPUT_FALSE.to_string(),
            "-auto-approve".to_string(),
        ];

        match plan_file.filter(|p| self.resolve_in_workdir(p).exists()) {
            Some(plan) => {
                args.push(plan.display().to_string());
            }
            None => {
                for var_file in &self.var_files {
                    args.push("-var-file".to_string());
                    args.push(var_file.clone());
                }
                args.extend(self.apply_args.iter().cloned());
            }
        }

        let result = self.run_wrapped("apply", &args).await?;
        if result.success() {
            debug!("Apply successful");
        } else {
            warn!(exit_code = result.exit_code, "Apply failed");
        }

        Ok(ApplyResult {
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
            command: result.command,
        })
    }

    fn resolve_in_workdir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        }
    }

    fn tfcmt_available(&self) -> bool {
        which::which("tfcmt").is_ok()
    }

    /// Run plan/apply, wrapped with tfcmt when it can post PR comments
    async fn run_wrapped(&self, operation: &str, tf_args: &[String]) -> Result<CommandResult> {
        if !self.use_tfcmt || !self.tfcmt_available() {
            return self.run_command(tf_args, None).await;
        }

        let (Some(token), Some(repo), Some(pr_number)) =
            (&self.github_token, &self.repo, self.pr_number)
        else {
            return self.run_command(tf_args, None).await;
        };
        let Some((owner, name)) = repo.split_once('/') else {
            return self.run_command(tf_args, None).await;
        };

        let mut args = vec![
            "tfcmt".to_string(),
            "-owner".to_string(),
            owner.to_string(),
            "-repo".to_string(),
            name.to_string(),
            "-pr".to_string(),
            pr_number.to_string(),
            operation.to_string(),
            "--".to_string(),
        ];
        args.extend(tf_args.iter().cloned());

        let env = HashMap::from([("GITHUB_TOKEN".to_string(), token.clone())]);
        self.run_command(&args, Some(env)).await
    }

    async fn run_command(
        &self,
        args: &[String],
        env: Option<HashMap<String, String>>,
    ) -> Result<CommandResult> {
        debug!(command = %args.join(" "), "Running command");

        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..])
            .current_dir(&self.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = env {
            cmd.envs(env);
        }

        let output = cmd.output().await.map_err(|source| ExecutorError::Launch {
            command: args[0].clone(),
            source,
        })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            command: args.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// Write an executable stub that echoes its args, optionally writes the
    /// file named after `-out`, and exits with the given code.
    #[cfg(unix)]
    fn stub_terraform(dir: &Path, exit_code: i32, write_out_file: bool) -> String {
        use std::os::unix::fs::PermissionsExt;

        let write_clause = if write_out_file {
            r#"
prev=""
for a in "$@"; do
  if [ "$prev" = "-out" ]; then printf 'plan-bytes' > "$a"; fi
  prev="$a"
done"#
        } else {
            ""
        };
        let script = format!("#!/bin/sh\necho \"$@\"\n{write_clause}\nexit {exit_code}\n");
        let path = dir.join("terraform-stub");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    fn executor(dir: &Path, exit_code: i32, write_out_file: bool) -> TerraformExecutor {
        let mut executor = TerraformExecutor::new(dir.to_path_buf());
        executor.binary = stub_terraform(dir, exit_code, write_out_file);
        executor.use_tfcmt = false;
        executor
    }

    fn positions(command: &[String], needle: &str) -> Vec<usize> {
        command
            .iter()
            .enumerate()
            .filter(|(_, a)| a == &needle)
            .map(|(i, _)| i)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn init_orders_backend_configs_before_extra_args() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = executor(dir.path(), 0, false);
        exec.backend_configs = vec!["backend/dev.hcl".to_string()];
        exec.init_args = vec!["-upgrade".to_string()];

        let result = exec.init().await.unwrap();
        assert!(result.success());
        let cmd = &result.command;
        assert_eq!(cmd[1], "init");
        assert_eq!(cmd[2], "-input=false");
        let backend = positions(cmd, "-backend-config")[0];
        assert_eq!(cmd[backend + 1], "backend/dev.hcl");
        assert!(positions(cmd, "-upgrade")[0] > backend);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn plan_with_changes_reports_success_and_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = executor(dir.path(), 2, true);
        exec.var_files = vec!["common.tfvars".to_string(), "dev.tfvars".to_string()];
        exec.plan_args = vec!["-refresh=false".to_string()];

        let result = exec.plan(Path::new("tfplan.bin")).await.unwrap();
        assert!(result.success());
        assert!(result.has_changes);
        assert_eq!(result.exit_code, 0);
        assert!(result.plan_file.is_some());
        assert_eq!(result.checksum.as_deref().map(str::len), Some(64));

        // var-files in order, extra args appended last
        let var_file_flags = positions(&result.command, "-var-file");
        assert_eq!(var_file_flags.len(), 2);
        assert_eq!(result.command[var_file_flags[0] + 1], "common.tfvars");
        assert_eq!(result.command[var_file_flags[1] + 1], "dev.tfvars");
        assert_eq!(result.command.last().unwrap(), "-refresh=false");
        let out_flag = positions(&result.command, "-out")[0];
        assert!(out_flag > var_file_flags[1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn plan_without_changes_has_no_changes_flag() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), 0, true);
        let result = exec.plan(Path::new("tfplan.bin")).await.unwrap();
        assert!(result.success());
        assert!(!result.has_changes);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_plan_keeps_exit_code_and_skips_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), 1, false);
        let result = exec.plan(Path::new("tfplan.bin")).await.unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 1);
        assert!(result.plan_file.is_none());
        assert!(result.checksum.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_plan_that_wrote_a_file_still_checksums_it() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), 1, true);
        let result = exec.plan(Path::new("tfplan.bin")).await.unwrap();
        assert!(!result.success());
        // The file exists, so a checksum is computed; trusting it is the
        // caller's decision.
        assert!(result.checksum.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_with_plan_file_excludes_var_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = executor(dir.path(), 0, false);
        exec.var_files = vec!["common.tfvars".to_string()];
        exec.apply_args = vec!["-parallelism=5".to_string()];

        fs::write(dir.path().join("tfplan-dev-abc123de.tfplan"), b"plan").unwrap();
        let result = exec
            .apply(Some(Path::new("tfplan-dev-abc123de.tfplan")))
            .await
            .unwrap();

        assert!(result.success());
        assert!(positions(&result.command, "-var-file").is_empty());
        assert!(positions(&result.command, "-parallelism=5").is_empty());
        assert_eq!(result.command.last().unwrap(), "tfplan-dev-abc123de.tfplan");
        assert!(result.command.contains(&"-auto-approve".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn direct_apply_uses_var_files_and_apply_args() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = executor(dir.path(), 0, false);
        exec.var_files = vec!["common.tfvars".to_string()];
        exec.apply_args = vec!["-parallelism=5".to_string()];

        let result = exec.apply(None).await.unwrap();
        assert!(result.success());
        let var_file = positions(&result.command, "-var-file")[0];
        assert_eq!(result.command[var_file + 1], "common.tfvars");
        assert_eq!(result.command.last().unwrap(), "-parallelism=5");
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = TerraformExecutor::new(dir.path().to_path_buf());
        exec.binary = "/nonexistent/terraform".to_string();
        exec.use_tfcmt = false;
        assert!(exec.init().await.is_err());
    }
}
