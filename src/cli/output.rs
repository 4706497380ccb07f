//! Styled terminal output for the command-line tool
//!
//! Status lines go to stderr so that stdout only ever carries command results
//! and can be piped.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: u8,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: u8, quiet: bool) -> Self {
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
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a message only when at least one `-v` was given
    pub fn verbose(&self, message: &str) {
        if self.is_verbose() {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a report row to stdout
    pub fn table_row(&self, key: &str, value: &str) {
        println!("  {:<20} {}", style(key).dim(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_verbose() {
        let output = Output::new(2, true);
        assert!(output.is_quiet());
        assert!(!output.is_verbose());

        let output = Output::new(1, false);
        assert!(output.is_verbose());
    }
}
