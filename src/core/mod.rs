//! Core business logic abstractions.
//!
//! Operations in this module report progress through [`ProgressSink`] and
//! observe cancellation through [`CancelToken`], so they can be driven from
//! the plain CLI, the interactive progress view, or tests.

pub mod pipeline;
mod progress;
mod runner;
pub mod worktree;

pub use progress::OutputSink;
pub use runner::WorktreeRunner;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────
// Progress reporting
// ─────────────────────────────────────────────────────────────────────────

/// Trait for core operations to report progress without depending on `Output`.
///
/// Commands create an adapter (e.g., `OutputSink`) that bridges this trait
/// to the actual output implementation. Tests can use `NullSink` to suppress
/// all output.
pub trait ProgressSink {
    /// Report an intermediate step (shown in verbose mode).
    fn on_step(&mut self, msg: &str);

    /// Report a warning (always shown).
    fn on_warning(&mut self, msg: &str);

    /// Report a debug message (shown in verbose mode).
    fn on_debug(&mut self, msg: &str);
}

/// A no-op sink that discards all progress messages.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_step(&mut self, _msg: &str) {}
    fn on_warning(&mut self, _msg: &str) {}
    fn on_debug(&mut self, _msg: &str) {}
}

/// Collects warnings so callers and tests can inspect them afterwards.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProgressSink for RecordingSink {
    fn on_step(&mut self, msg: &str) {
        self.steps.push(msg.to_string());
    }

    fn on_warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn on_debug(&mut self, _msg: &str) {}
}

// ─────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────

/// Shared flag telling in-flight work to stop.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
