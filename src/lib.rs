//! gwt: one git worktree per branch.
//!
//! Worktrees live under `<root>/<project>/<branch>`. Creating one copies the
//! configured files from the source checkout and runs the setup commands
//! inside it; `done` and `clean` fold finished branches back into the base.

pub mod config;
pub mod core;
pub mod error;
pub mod git;
pub mod logging;
pub mod output;
pub mod styles;
pub mod ui;
pub mod utils;

/// Version shown by `gwt --version`, with the commit for dev builds.
pub const VERSION: &str = env!("GWT_VERSION_DISPLAY");
