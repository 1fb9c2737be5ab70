// Output formatting and styling

use colored::{ColoredString, Colorize};

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    fn glyph(&self, plain: &str, painted: ColoredString, msg: &str) -> String {
        if self.use_colors {
            format!("{painted} {msg}")
        } else {
            format!("{plain} {msg}")
        }
    }

    pub fn success(&self, msg: &str) -> String {
        self.glyph("✓", "✓".green().bold(), msg)
    }

    pub fn error(&self, msg: &str) -> String {
        self.glyph("✗", "✗".red().bold(), msg)
    }

    pub fn warning(&self, msg: &str) -> String {
        self.glyph("⚠", "⚠".yellow(), msg)
    }

    pub fn info(&self, msg: &str) -> String {
        self.glyph("ℹ", "ℹ".blue(), msg)
    }

    /// Format a setting name for key/value listings
    pub fn key(&self, name: &str) -> String {
        if self.use_colors {
            name.cyan().to_string()
        } else {
            name.to_string()
        }
    }
}

/// Print a success message to stdout
pub fn print_success(msg: &str) {
    println!("{}", OutputStyle::default().success(msg));
}

/// Print an error message to stderr
pub fn print_error(msg: &str) {
    eprintln!("{}", OutputStyle::default().error(msg));
}

/// Print a warning message to stdout
pub fn print_warning(msg: &str) {
    println!("{}", OutputStyle::default().warning(msg));
}

/// Print an info message to stdout
pub fn print_info(msg: &str) {
    println!("{}", OutputStyle::default().info(msg));
}

/// Print an aligned key/value row
pub fn print_setting(name: &str, value: &str) {
    println!("  {:<20} {}", OutputStyle::default().key(name), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_formatting_without_colors() {
        let style = OutputStyle { use_colors: false };
        assert_eq!(style.success("done"), "✓ done");
        assert_eq!(style.error("broken"), "✗ broken");
        assert_eq!(style.warning("careful"), "⚠ careful");
        assert_eq!(style.key("Environment"), "Environment");
    }
}
