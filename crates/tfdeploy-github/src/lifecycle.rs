//! GitHub PR lifecycle operations
//!
//! Every operation here is best-effort: a failed API call is logged and
//! swallowed, never propagated. Deployments must not fail because a
//! reaction or comment could not be posted.

use std::collections::HashMap;

use base64::Engine;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Manages the GitHub PR lifecycle around a deployment
///
/// Shells out to the `gh` CLI, which handles authentication and API
/// plumbing. The token, when present, is injected as `GITHUB_TOKEN`.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    /// Repository in `owner/name` form
    pub repo: String,

    /// Token passed to `gh`; falls back to ambient auth when absent
    pub github_token: Option<String>,
}

impl LifecycleManager {
    pub fn new(repo: impl Into<String>, github_token: Option<String>) -> Self {
        Self {
            repo: repo.into(),
            github_token,
        }
    }

    /// Update the GitHub deployment status
    pub async fn update_deployment_status(
        &self,
        deployment_id: &str,
        state: &str,
        environment: &str,
    ) {
        if deployment_id.is_empty() {
            return;
        }

        info!(deployment_id, state, "Updating deployment status");
        self.gh_api(
            "POST",
            &format!("repos/{}/deployments/{}/statuses", self.repo, deployment_id),
            &[("state", state), ("environment", environment)],
        )
        .await;
    }

    /// Remove the initial "eyes" reaction from the trigger comment
    pub async fn remove_reaction(&self, comment_id: &str, reaction_id: &str) {
        if comment_id.is_empty() || reaction_id.is_empty() {
            return;
        }

        debug!(comment_id, reaction_id, "Removing initial reaction");
        self.run_gh(&[
            "api",
            "--method",
            "DELETE",
            &format!(
                "repos/{}/issues/comments/{}/reactions/{}",
                self.repo, comment_id, reaction_id
            ),
        ])
        .await;
    }

    /// Add a result reaction (+1 / -1) to the trigger comment
    pub async fn add_reaction(&self, comment_id: &str, content: &str) {
        if comment_id.is_empty() {
            return;
        }

        debug!(comment_id, content, "Adding reaction");
        self.gh_api(
            "POST",
            &format!("repos/{}/issues/comments/{}/reactions", self.repo, comment_id),
            &[("content", content)],
        )
        .await;
    }

    /// Post a result comment on the pull request
    pub async fn post_result_comment(&self, pr_number: &str, body: &str) {
        if pr_number.is_empty() {
            return;
        }

        info!(pr_number, "Posting deployment result comment");
        self.gh_api(
            "POST",
            &format!("repos/{}/issues/{}/comments", self.repo, pr_number),
            &[("body", body)],
        )
        .await;
    }

    /// Format the result comment body from the deployment context
    ///
    /// Pure. The context is the same TF_BD_* map exported to hooks, so
    /// comment content and hook environment can never disagree.
    pub fn format_result_comment(
        &self,
        status: &str,
        env_vars: &HashMap<String, String>,
        failure_reason: Option<&str>,
    ) -> String {
        let get = |key: &str| env_vars.get(key).map(String::as_str).unwrap_or("unknown");
        let actor = get("TF_BD_ACTOR");
        let git_ref = get("TF_BD_REF");
        let environment = get("TF_BD_ENVIRONMENT");
        let noop = env_vars
            .get("TF_BD_NOOP")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let deploy_type = if noop { "**noop** deployed" } else { "deployed" };

        let (header, message) = if status == "success" {
            (
                "### Deployment Results ✅".to_string(),
                format!(
                    "**{actor}** successfully {deploy_type} branch `{git_ref}` to **{environment}**"
                ),
            )
        } else {
            (
                "### ⚠️ Cannot proceed with deployment".to_string(),
                failure_reason
                    .unwrap_or(
                        "An unexpected error occurred. Please review the workflow logs for details.",
                    )
                    .to_string(),
            )
        };

        let metadata = json!({
            "type": env_vars.get("TF_BD_TYPE"),
            "environment": { "name": env_vars.get("TF_BD_ENVIRONMENT") },
            "deployment": { "id": env_vars.get("TF_BD_DEPLOYMENT_ID") },
            "git": {
                "ref": env_vars.get("TF_BD_REF"),
                "commit": env_vars.get("TF_BD_SHA"),
            },
            "context": {
                "actor": env_vars.get("TF_BD_ACTOR"),
                "noop": noop,
            },
        });
        let metadata = serde_json::to_string_pretty(&metadata).unwrap_or_default();

        format!(
            "{header}\n\n{message}\n\n<details><summary>Details</summary>\n\n```json\n{metadata}\n```\n\n</details>"
        )
    }

    /// Delete the environment's lock branch unless the lock is sticky
    ///
    /// Lock content lives in `lock.json` on a `{environment}-branch-deploy-lock`
    /// branch. A missing or unreadable lock is treated as non-sticky.
    pub async fn remove_non_sticky_lock(&self, environment: &str) {
        let lock_ref = format!("{environment}-branch-deploy-lock");
        debug!(lock_ref = %lock_ref, "Checking for non-sticky lock");

        let sticky = self
            .fetch_lock_content(&lock_ref)
            .await
            .and_then(|lock| lock.get("sticky").cloned())
            .map(|v| match v {
                serde_json::Value::Bool(b) => b,
                serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
                _ => false,
            })
            .unwrap_or(false);

        if sticky {
            info!(lock_ref = %lock_ref, "Lock is sticky, preserving");
            return;
        }

        info!(lock_ref = %lock_ref, "Removing non-sticky lock");
        self.run_gh(&[
            "api",
            "--method",
            "DELETE",
            &format!("repos/{}/git/refs/heads/{}", self.repo, lock_ref),
        ])
        .await;
    }

    async fn fetch_lock_content(&self, lock_ref: &str) -> Option<serde_json::Value> {
        let endpoint = format!("repos/{}/contents/lock.json", self.repo);
        let ref_field = format!("ref={lock_ref}");
        let output = self
            .run_gh(&["api", &endpoint, "-f", &ref_field, "--jq", ".content"])
            .await?;

        // The contents API base64-encodes the file, with line wrapping.
        let stripped: String = output.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(stripped)
            .ok()?;
        serde_json::from_slice(&decoded).ok()
    }

    async fn gh_api(&self, method: &str, endpoint: &str, fields: &[(&str, &str)]) {
        let mut args = vec![
            "api".to_string(),
            "--method".to_string(),
            method.to_string(),
            endpoint.to_string(),
        ];
        for (key, value) in fields {
            args.push("-f".to_string());
            args.push(format!("{key}={value}"));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_gh(&args).await;
    }

    async fn run_gh(&self, args: &[&str]) -> Option<String> {
        let mut cmd = Command::new("gh");
        cmd.args(args);
        if let Some(token) = &self.github_token {
            cmd.env("GITHUB_TOKEN", token);
        }

        match cmd.output().await {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                warn!(
                    args = %args.join(" "),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "gh command failed"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to run gh");
                None
            }
        }
    }
}
