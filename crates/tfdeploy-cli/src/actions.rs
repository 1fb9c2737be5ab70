//! GitHub Actions output plumbing
//!
//! Outputs are appended to the file named by `GITHUB_OUTPUT`. Multiline
//! values use the heredoc form with a random delimiter so a value can never
//! terminate its own block.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::debug;

/// Append one output to a GitHub Actions output file
pub fn write_output(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if value.contains('\n') {
        let delimiter = uuid::Uuid::new_v4().simple().to_string();
        writeln!(file, "{name}<<{delimiter}\n{value}\n{delimiter}")?;
    } else {
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}

/// Set a GitHub Actions output, if running under Actions
///
/// Outside of Actions (no `GITHUB_OUTPUT`) the value is only logged. Write
/// failures are logged and ignored; outputs are advisory.
pub fn set_output(name: &str, value: &str) {
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
        if let Err(e) = write_output(Path::new(&path), name, value) {
            tracing::warn!(name, error = %e, "Failed to write GitHub Actions output");
        }
    }
    let preview: String = value.chars().take(50).collect();
    let ellipsis = if value.len() > 50 { "..." } else { "" };
    debug!(name, value = %format!("{preview}{ellipsis}"), "Output");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_uses_key_value_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        write_output(&path, "has_changes", "true").unwrap();
        write_output(&path, "plan_file", "tfplan-dev-abc123de.tfplan").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "has_changes=true\nplan_file=tfplan-dev-abc123de.tfplan\n"
        );
    }

    #[test]
    fn multiline_uses_heredoc_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        write_output(&path, "summary", "line one\nline two").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("summary<<").unwrap();
        assert_eq!(delimiter.len(), 32);
        assert_eq!(lines.next(), Some("line one"));
        assert_eq!(lines.next(), Some("line two"));
        assert_eq!(lines.next(), Some(delimiter));
    }
}
