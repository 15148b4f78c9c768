//! Styled diagnostics on stderr.

use console::style;

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold().for_stderr(), message);
}

/// Print an indented, dimmed detail line to stderr.
pub fn dim(message: &str) {
    eprintln!("  {}", style(message).dim().for_stderr());
}
