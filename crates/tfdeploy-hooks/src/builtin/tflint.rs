//! TFLint built-in hook

use std::path::Path;

use crate::context::HookContext;

use super::{run_tool, Finding, HookOutput, ToolInvocation};

/// Timeout for a tflint run, in seconds
const TFLINT_TIMEOUT_SECS: u64 = 300;

/// Runs `tflint --format json` and summarizes issues by severity
#[derive(Debug, Clone, Default)]
pub struct TflintCheck {
    config_file: Option<String>,
}

impl TflintCheck {
    pub fn new() -> Self {
        Self { config_file: None }
    }

    /// Point tflint at a specific configuration file
    pub fn with_config(config_file: impl Into<String>) -> Self {
        Self {
            config_file: Some(config_file.into()),
        }
    }

    pub(crate) async fn run(&self, _context: &HookContext, working_dir: &Path) -> HookOutput {
        let mut args = vec!["--format", "json"];
        if let Some(config) = &self.config_file {
            args.push("--config");
            args.push(config);
        }

        let invocation = run_tool("tflint", &args, working_dir, TFLINT_TIMEOUT_SECS).await;

        if invocation.timed_out {
            return HookOutput {
                success: false,
                exit_code: invocation.exit_code,
                summary: "TFLint timed out".to_string(),
                markdown: format!(
                    "### TFLint ⏱️\n\nLinting timed out after {TFLINT_TIMEOUT_SECS} seconds."
                ),
                findings: Vec::new(),
            };
        }

        parse_tflint_output(&invocation)
    }
}

fn parse_tflint_output(invocation: &ToolInvocation) -> HookOutput {
    let findings: Vec<Finding> = match serde_json::from_str::<serde_json::Value>(&invocation.stdout)
    {
        Ok(output) => output["issues"]
            .as_array()
            .map(|issues| {
                issues
                    .iter()
                    .map(|i| Finding {
                        severity: i["rule"]["severity"].as_str().unwrap_or("warning").to_string(),
                        summary: i["message"].as_str().unwrap_or("").to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    };

    let error_count = findings.iter().filter(|f| f.severity == "error").count();
    let warning_count = findings.iter().filter(|f| f.severity == "warning").count();
    let success = invocation.exit_code == 0;

    if success {
        HookOutput {
            success: true,
            exit_code: invocation.exit_code,
            summary: "No linting issues".to_string(),
            markdown: "### TFLint ✅\n\nNo issues found.".to_string(),
            findings,
        }
    } else {
        HookOutput {
            success: false,
            exit_code: invocation.exit_code,
            summary: format!("Found {} linting issues", findings.len()),
            markdown: format!(
                "### TFLint ⚠️\n\n\
                 | Severity | Count |\n|----------|-------|\n\
                 | Errors | {error_count} |\n| Warnings | {warning_count} |\n\n\
                 <details>\n<summary>Details</summary>\n\n```\n{}\n```\n\n</details>",
                invocation.stdout
            ),
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_lint_succeeds() {
        let invocation = ToolInvocation {
            exit_code: 0,
            stdout: r#"{"issues": []}"#.to_string(),
            stderr: String::new(),
            timed_out: false,
        };
        assert!(parse_tflint_output(&invocation).success);
    }

    #[test]
    fn issues_are_split_by_severity() {
        let invocation = ToolInvocation {
            exit_code: 2,
            stdout: r#"{"issues": [
                {"rule": {"severity": "error"}, "message": "deprecated syntax"},
                {"rule": {"severity": "warning"}, "message": "unused declaration"},
                {"rule": {"severity": "warning"}, "message": "naming"}
            ]}"#
            .to_string(),
            stderr: String::new(),
            timed_out: false,
        };
        let out = parse_tflint_output(&invocation);
        assert!(!out.success);
        assert!(out.summary.contains("3 linting issues"));
        assert!(out.markdown.contains("| Errors | 1 |"));
        assert!(out.markdown.contains("| Warnings | 2 |"));
        assert_eq!(out.findings.len(), 3);
    }
}
