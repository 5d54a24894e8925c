//! Output abstraction layer for separating IO from business logic.
//!
//! Commands accept `&mut dyn Output` and use its methods instead of direct
//! `println!` or `eprintln!` calls:
//!
//! ```ignore
//! pub fn run_with_output(args: Args, output: &mut dyn Output) -> Result<()> {
//!     output.step("Removing worktree...");
//!     output.result("Removed worktree 'feature'");
//!     output.handoff(&path);
//!     Ok(())
//! }
//! ```
//!
//! Stdout carries only data and the handoff path so shell wrappers can
//! capture it; every human-facing message goes to stderr.

mod cli;

pub use cli::CliOutput;
pub use test::{OutputEntry, TestOutput};

use crate::error::GwtError;
use std::path::Path;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-oriented text with colors and tables.
    #[default]
    Pretty,
    /// `key=value` lines and tab-separated tables.
    Plain,
    /// A single pretty-printed JSON document.
    Json,
}

impl OutputFormat {
    /// Resolve the `--plain` / `--json` flags.
    pub fn from_flags(plain: bool, json: bool) -> Result<Self, GwtError> {
        match (plain, json) {
            (true, true) => Err(GwtError::Conflict(
                "--plain and --json cannot be used together".to_string(),
            )),
            (true, false) => Ok(OutputFormat::Plain),
            (false, true) => Ok(OutputFormat::Json),
            (false, false) => Ok(OutputFormat::Pretty),
        }
    }

    pub fn is_machine(self) -> bool {
        !matches!(self, OutputFormat::Pretty)
    }
}

/// Configuration for output behavior.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Suppress most output when true.
    pub quiet: bool,
    /// Enable step/debug output when true.
    pub verbose: bool,
    pub format: OutputFormat,
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            format: OutputFormat::Pretty,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Trait for abstracting output operations.
///
/// Implementors should respect `quiet` and `verbose` modes where appropriate.
pub trait Output {
    // ─────────────────────────────────────────────────────────────────────────
    // Basic Messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Display an informational message.
    /// Respects quiet mode.
    fn info(&mut self, msg: &str);

    /// Display a success message.
    /// Respects quiet mode.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    /// Always shown (not affected by quiet mode).
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    /// Always shown (not affected by quiet mode).
    fn error(&mut self, msg: &str);

    /// Display a debug message.
    /// Only shown in verbose mode.
    fn debug(&mut self, msg: &str);

    // ─────────────────────────────────────────────────────────────────────────
    // Structured Output
    // ─────────────────────────────────────────────────────────────────────────

    /// Display an intermediate step message.
    /// Only shown in verbose mode.
    fn step(&mut self, msg: &str);

    /// Display a final result message: the 1-2 line summary of a command.
    fn result(&mut self, msg: &str);

    // ─────────────────────────────────────────────────────────────────────────
    // Stdout
    // ─────────────────────────────────────────────────────────────────────────

    /// Emit machine-readable content on stdout, unaffected by quiet mode.
    fn data(&mut self, content: &str);

    /// Emit the path a shell wrapper should `cd` into, alone on stdout.
    fn handoff(&mut self, path: &Path);

    /// How results should be rendered.
    fn format(&self) -> OutputFormat;
}
