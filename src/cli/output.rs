//! Styled status output
//!
//! stdout belongs to the report, so every status message here goes to
//! stderr. Errors are shown even in quiet mode.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a key-value pair in verbose mode
    pub fn key_value(&self, key: &str, value: &str) {
        if self.verbose && !self.quiet {
            eprintln!("  {:<12} {}", style(key).dim(), style(value).bold());
        }
    }
}
