//! CLI output implementation.

use super::{Output, OutputConfig, OutputFormat};
use crate::styles::{self, colors_enabled_stderr};
use std::io::Write;
use std::path::Path;

/// CLI output implementation.
///
/// Git-like format on stderr:
/// - `step()` → verbose only, dimmed
/// - `result()` → primary output, bold (unless quiet)
/// - `warning()` → `warning: {msg}`
/// - `error()` → `error: {msg}`
///
/// `data()` and `handoff()` are the only writers to stdout.
#[derive(Debug)]
pub struct CliOutput {
    config: OutputConfig,
    color: bool,
}

impl CliOutput {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            color: colors_enabled_stderr(),
        }
    }

    fn paint(&self, text: &str, style: &str) -> String {
        styles::paint(text, style, self.color)
    }

    fn shows_messages(&self) -> bool {
        !self.config.quiet
    }
}

impl Output for CliOutput {
    fn info(&mut self, msg: &str) {
        if self.shows_messages() {
            eprintln!("{msg}");
        }
    }

    fn success(&mut self, msg: &str) {
        if self.shows_messages() {
            eprintln!("{}", self.paint(msg, styles::GREEN));
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{} {msg}", self.paint("warning:", styles::YELLOW));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{} {msg}", self.paint("error:", styles::RED));
    }

    fn debug(&mut self, msg: &str) {
        if self.config.verbose {
            eprintln!("{}", self.paint(&format!("debug: {msg}"), styles::DIM));
        }
    }

    fn step(&mut self, msg: &str) {
        if self.config.verbose && self.shows_messages() {
            eprintln!("{}", self.paint(msg, styles::DIM));
        }
    }

    fn result(&mut self, msg: &str) {
        if self.shows_messages() {
            eprintln!("{}", self.paint(msg, styles::BOLD));
        }
    }

    fn data(&mut self, content: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed pipe (`gwt list --json | head`) is not worth a panic.
        let _ = stdout.write_all(content.as_bytes());
        if !content.ends_with('\n') {
            let _ = stdout.write_all(b"\n");
        }
        let _ = stdout.flush();
    }

    fn handoff(&mut self, path: &Path) {
        self.data(&path.display().to_string());
    }

    fn format(&self) -> OutputFormat {
        self.config.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_output_keeps_format() {
        let config = OutputConfig::new(true, true).with_format(OutputFormat::Json);
        assert_eq!(CliOutput::new(config).format(), OutputFormat::Json);
        assert_eq!(
            CliOutput::new(OutputConfig::default()).format(),
            OutputFormat::Pretty
        );
    }
}
