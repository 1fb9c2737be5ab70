//! Trivy security scan built-in hook

use std::path::Path;

use crate::context::HookContext;

use super::{run_tool, HookOutput, ToolInvocation};

/// Timeout for a trivy scan, in seconds
const TRIVY_TIMEOUT_SECS: u64 = 600;

/// Runs `trivy fs` over the working directory and summarizes findings
///
/// Scans for vulnerabilities, secrets, and misconfigurations at or above the
/// configured severity.
#[derive(Debug, Clone)]
pub struct TrivyScan {
    severity: String,
}

impl TrivyScan {
    pub fn new() -> Self {
        Self {
            severity: "HIGH,CRITICAL".to_string(),
        }
    }

    /// Override the severity filter (comma-separated trivy severities)
    pub fn with_severity(severity: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
        }
    }

    pub(crate) async fn run(&self, _context: &HookContext, working_dir: &Path) -> HookOutput {
        let invocation = run_tool(
            "trivy",
            &[
                "fs",
                "--security-checks",
                "vuln,secret,config",
                "--severity",
                &self.severity,
                "--format",
                "json",
                ".",
            ],
            working_dir,
            TRIVY_TIMEOUT_SECS,
        )
        .await;

        if invocation.timed_out {
            return HookOutput {
                success: false,
                exit_code: invocation.exit_code,
                summary: "Trivy timed out".to_string(),
                markdown: format!(
                    "### Trivy Security Scan ⏱️\n\nScan timed out after {TRIVY_TIMEOUT_SECS} seconds."
                ),
                findings: Vec::new(),
            };
        }

        parse_trivy_output(&invocation)
    }
}

impl Default for TrivyScan {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_trivy_output(invocation: &ToolInvocation) -> HookOutput {
    let count = |results: &[serde_json::Value], key: &str| -> usize {
        results
            .iter()
            .filter_map(|r| r[key].as_array().map(|a| a.len()))
            .sum()
    };

    let (vuln_count, secret_count, misconfig_count) =
        match serde_json::from_str::<serde_json::Value>(&invocation.stdout) {
            Ok(output) => {
                let results = output["Results"].as_array().cloned().unwrap_or_default();
                (
                    count(&results, "Vulnerabilities"),
                    count(&results, "Secrets"),
                    count(&results, "Misconfigurations"),
                )
            }
            Err(_) => (0, 0, 0),
        };
    let total = vuln_count + secret_count + misconfig_count;
    let success = invocation.exit_code == 0;

    if success {
        HookOutput {
            success: true,
            exit_code: invocation.exit_code,
            summary: "No security issues found".to_string(),
            markdown:
                "### Trivy Security Scan ✅\n\nNo vulnerabilities, secrets, or misconfigurations detected."
                    .to_string(),
            findings: Vec::new(),
        }
    } else {
        HookOutput {
            success: false,
            exit_code: invocation.exit_code,
            summary: format!("Found {total} security issues"),
            markdown: format!(
                "### Trivy Security Scan ❌\n\n\
                 | Type | Count |\n|------|-------|\n\
                 | Vulnerabilities | {vuln_count} |\n\
                 | Secrets | {secret_count} |\n\
                 | Misconfigurations | {misconfig_count} |\n\n\
                 <details>\n<summary>Details</summary>\n\n```\n{}\n```\n\n</details>",
                invocation.stderr
            ),
            findings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_scan_succeeds() {
        let invocation = ToolInvocation {
            exit_code: 0,
            stdout: r#"{"Results": []}"#.to_string(),
            stderr: String::new(),
            timed_out: false,
        };
        let out = parse_trivy_output(&invocation);
        assert!(out.success);
        assert!(out.summary.contains("No security issues"));
    }

    #[test]
    fn findings_are_counted_per_category() {
        let invocation = ToolInvocation {
            exit_code: 1,
            stdout: r#"{"Results": [
                {"Vulnerabilities": [{}, {}], "Secrets": [{}]},
                {"Misconfigurations": [{}]}
            ]}"#
            .to_string(),
            stderr: String::new(),
            timed_out: false,
        };
        let out = parse_trivy_output(&invocation);
        assert!(!out.success);
        assert!(out.summary.contains("4 security issues"));
        assert!(out.markdown.contains("| Vulnerabilities | 2 |"));
        assert!(out.markdown.contains("| Secrets | 1 |"));
        assert!(out.markdown.contains("| Misconfigurations | 1 |"));
    }
}
