//! `terraform validate` built-in hook
//!
//! The only built-in that runs by default: a first-class terraform command
//! and a foundational safety check.

use std::path::Path;

use crate::context::HookContext;

use super::{run_tool, Finding, HookOutput, ToolInvocation};

/// Timeout for a validate run, in seconds
const VALIDATE_TIMEOUT_SECS: u64 = 300;

/// Runs `terraform validate -json` and parses its diagnostics
#[derive(Debug, Clone, Default)]
pub struct TerraformValidate;

impl TerraformValidate {
    pub fn new() -> Self {
        Self
    }

    pub(crate) async fn run(&self, _context: &HookContext, working_dir: &Path) -> HookOutput {
        let invocation = run_tool(
            "terraform",
            &["validate", "-json"],
            working_dir,
            VALIDATE_TIMEOUT_SECS,
        )
        .await;

        if invocation.timed_out {
            return HookOutput {
                success: false,
                exit_code: invocation.exit_code,
                summary: "Terraform validate timed out".to_string(),
                markdown: format!(
                    "### Terraform Validate ⏱️\n\nValidation timed out after {VALIDATE_TIMEOUT_SECS} seconds."
                ),
                findings: Vec::new(),
            };
        }

        parse_validate_output(&invocation)
    }
}

fn parse_validate_output(invocation: &ToolInvocation) -> HookOutput {
    let (valid, error_count, warning_count, findings) =
        match serde_json::from_str::<serde_json::Value>(&invocation.stdout) {
            Ok(output) => {
                let valid = output["valid"].as_bool().unwrap_or(false);
                let errors = output["error_count"].as_u64().unwrap_or(0);
                let warnings = output["warning_count"].as_u64().unwrap_or(0);
                let findings = output["diagnostics"]
                    .as_array()
                    .map(|diags| {
                        diags
                            .iter()
                            .map(|d| Finding {
                                severity: d["severity"].as_str().unwrap_or("error").to_string(),
                                summary: d["summary"].as_str().unwrap_or("").to_string(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (valid, errors, warnings, findings)
            }
            Err(_) => {
                let valid = invocation.exit_code == 0;
                (valid, u64::from(!valid), 0, Vec::new())
            }
        };

    if valid {
        HookOutput {
            success: true,
            exit_code: invocation.exit_code,
            summary: "Terraform configuration is valid".to_string(),
            markdown: "### Terraform Validate ✅\n\nConfiguration is valid. No errors or warnings."
                .to_string(),
            findings,
        }
    } else {
        let diagnostics = if invocation.stderr.is_empty() {
            &invocation.stdout
        } else {
            &invocation.stderr
        };
        HookOutput {
            success: false,
            exit_code: invocation.exit_code,
            summary: format!(
                "Terraform validate failed: {error_count} errors, {warning_count} warnings"
            ),
            markdown: format!(
                "### Terraform Validate ❌\n\n\
                 | Severity | Count |\n|----------|-------|\n\
                 | Errors | {error_count} |\n| Warnings | {warning_count} |\n\n\
                 <details>\n<summary>Diagnostics</summary>\n\n```\n{diagnostics}\n```\n\n</details>"
            ),
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(exit_code: i32, stdout: &str) -> ToolInvocation {
        ToolInvocation {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            timed_out: false,
        }
    }

    #[test]
    fn valid_output_succeeds() {
        let out = parse_validate_output(&invocation(
            0,
            r#"{"valid": true, "error_count": 0, "warning_count": 0, "diagnostics": []}"#,
        ));
        assert!(out.success);
        assert!(out.summary.contains("valid"));
        assert!(out.findings.is_empty());
    }

    #[test]
    fn invalid_output_carries_findings() {
        let out = parse_validate_output(&invocation(
            1,
            r#"{"valid": false, "error_count": 2, "warning_count": 1,
               "diagnostics": [{"severity": "error", "summary": "bad ref"}]}"#,
        ));
        assert!(!out.success);
        assert!(out.summary.contains("2 errors"));
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].severity, "error");
        assert!(out.markdown.contains("| Errors | 2 |"));
    }

    #[test]
    fn unparseable_output_falls_back_to_exit_code() {
        assert!(parse_validate_output(&invocation(0, "not json")).success);
        assert!(!parse_validate_output(&invocation(1, "not json")).success);
    }
}
