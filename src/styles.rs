//! Terminal text styling utilities.
//!
//! Keeps ANSI escape codes isolated from application code. Everything gwt
//! styles is written to stderr, so only stderr is consulted.

use std::io::IsTerminal;

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
pub const RESET: &str = "\x1b[0m";

/// Whether stderr should receive ANSI colors.
///
/// Honors `NO_COLOR` and a `dumb` terminal.
pub fn colors_enabled_stderr() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Wrap `text` in `style` when `enabled`, otherwise return it unchanged.
pub fn paint(text: &str, style: &str, enabled: bool) -> String {
    if enabled {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}
