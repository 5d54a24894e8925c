//! Interactive flows: the live create view and the worktree picker.
//!
//! Both render on stderr so stdout stays free for the path handed to the
//! shell wrapper.

pub mod create;
pub mod list;

use crate::error::GwtError;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Set to `1` by the shell wrapper, which captures stdout.
pub const FORCE_TUI_ENV: &str = "GWT_FORCE_TUI";

/// How an interactive flow ended.
#[derive(Debug)]
pub enum FlowOutcome {
    /// The user picked (or the flow produced) a worktree path.
    Selected(PathBuf),
    Cancelled,
    Failed(GwtError),
}

/// Whether an interactive UI can be shown.
///
/// Needs a real terminal on stdin and stderr and a usable `TERM`. stdout
/// must be a terminal too, unless the shell wrapper is capturing it and has
/// set `GWT_FORCE_TUI=1`.
pub fn has_interactive_tty() -> bool {
    let term = std::env::var("TERM").unwrap_or_default();
    let forced = std::env::var(FORCE_TUI_ENV).is_ok_and(|v| v == "1");
    tty_allows_ui(
        term.trim(),
        std::io::stdin().is_terminal(),
        std::io::stderr().is_terminal(),
        std::io::stdout().is_terminal(),
        forced,
    )
}

fn tty_allows_ui(term: &str, stdin: bool, stderr: bool, stdout: bool, forced: bool) -> bool {
    if term.is_empty() || term == "dumb" {
        return false;
    }
    stdin && stderr && (stdout || forced)
}
