//! Command modules for gwt.
//!
//! Each module owns one subcommand: its clap `Args` and a `run()` entry
//! point. Rendering goes through [`gwt::output::Output`].

pub mod clean;
pub mod done;
pub mod init;
pub mod list;
pub mod new;
pub mod remove;
pub mod shell;
pub mod switch;

use anyhow::{Context, Result};
use gwt::core::CancelToken;
use gwt::error::GwtError;
use gwt::git::GitCommand;
use std::path::PathBuf;

/// Exit status of a run the user cancelled.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Process working directory, where configuration is read and files are
/// copied from.
pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Cannot determine the current directory")
}

/// A git gateway for the repository containing the working directory.
pub(crate) fn repo_git() -> Result<GitCommand> {
    let git = GitCommand::new(false);
    git.common_dir().context("Not inside a Git repository")?;
    Ok(git)
}

/// Cancel `token` on Ctrl+C.
///
/// Only one handler can be installed per process; a second attempt is
/// logged and ignored.
pub(crate) fn cancel_on_interrupt(token: &CancelToken) {
    let token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
        tracing::debug!(error = %e, "could not install interrupt handler");
    }
}

/// Map an interactive cancellation to the error `main` turns into exit 130.
pub(crate) fn cancelled() -> anyhow::Error {
    GwtError::Cancelled.into()
}
