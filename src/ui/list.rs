//! Interactive worktree picker for `gwt list`.
//!
//! Prompts are drawn on stderr; choosing "Switch" hands the worktree path
//! back so the command can print it for the shell wrapper.

use super::FlowOutcome;
use crate::config::{contract_home, Config};
use crate::core::worktree::remove;
use crate::core::{OutputSink, ProgressSink};
use crate::error::{GwtError, Result};
use crate::git::{GitCommand, Worktree};
use crate::output::Output;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use std::io;
use std::path::Path;

const ACTIONS: &[&str] = &["Switch", "Delete", "Back"];

/// Run the picker until the user switches to a worktree or quits.
pub fn run(git: &GitCommand, config: &Config, output: &mut dyn Output) -> FlowOutcome {
    let home = dirs::home_dir();
    loop {
        let worktrees = match git.list_worktrees() {
            Ok(worktrees) => worktrees,
            Err(e) => return FlowOutcome::Failed(e.into()),
        };
        if worktrees.is_empty() {
            output.info("No worktrees found for this project");
            output.info("Create one with: gwt new <branch-name>");
            return FlowOutcome::Cancelled;
        }

        let labels = row_labels(&worktrees, home.as_deref());
        let picked = match select("Git Worktrees", &labels) {
            Ok(Some(index)) => &worktrees[index],
            Ok(None) => return FlowOutcome::Cancelled,
            Err(e) => return FlowOutcome::Failed(e),
        };

        match select(&format!("{} ", display_branch(picked)), ACTIONS) {
            Ok(Some(0)) => return FlowOutcome::Selected(picked.path.clone()),
            Ok(Some(1)) => {
                let mut sink = OutputSink(&mut *output);
                let confirm_delete = config.settings.confirm_delete;
                let result = delete_entry(git, picked, confirm_delete, confirm, &mut sink);
                match result {
                    Ok(true) => {
                        output.success(&format!("Removed worktree: {}", picked.path.display()))
                    }
                    Ok(false) => {}
                    Err(e) => output.error(&e.to_string()),
                }
            }
            Ok(_) => {}
            Err(e) => return FlowOutcome::Failed(e),
        }
    }
}

/// Delete `worktree`, asking first when `confirm_delete` is set.
///
/// If git refuses because of local changes, `ask` decides whether to force.
/// Returns false when the user declined.
pub fn delete_entry(
    git: &GitCommand,
    worktree: &Worktree,
    confirm_delete: bool,
    mut ask: impl FnMut(&str) -> Result<bool>,
    sink: &mut dyn ProgressSink,
) -> Result<bool> {
    let main = git.main_worktree()?;
    if same_path(&worktree.path, &main) {
        return Err(GwtError::Conflict(
            "refusing to delete the main worktree".to_string(),
        ));
    }

    let label = display_branch(worktree);
    if confirm_delete && !ask(&format!("Delete worktree '{label}'?"))? {
        return Ok(false);
    }

    leave_if_inside(&worktree.path, &main);

    match remove_once(git, worktree, false, sink) {
        Err(e) if remove::is_dirty_refusal(&e) => {
            if !ask(&format!("'{label}' has local changes. Delete anyway?"))? {
                return Ok(false);
            }
            remove_once(git, worktree, true, sink)?;
        }
        other => other?,
    }
    Ok(true)
}

fn remove_once(
    git: &GitCommand,
    worktree: &Worktree,
    force: bool,
    sink: &mut dyn ProgressSink,
) -> Result<()> {
    if worktree.branch.is_empty() {
        remove::remove(git, &worktree.path, force)
    } else {
        remove::remove_with_branch_cleanup(git, &worktree.branch, force, sink).map(drop)
    }
}

/// Step out of a worktree that is about to disappear.
fn leave_if_inside(path: &Path, main: &Path) {
    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    if cwd.starts_with(path) {
        if let Err(e) = std::env::set_current_dir(main) {
            tracing::debug!(error = %e, "could not leave the worktree being removed");
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn display_branch(worktree: &Worktree) -> &str {
    if worktree.branch.is_empty() {
        "(detached)"
    } else {
        &worktree.branch
    }
}

/// One aligned `branch  path` label per worktree, with home shown as `~`.
fn row_labels(worktrees: &[Worktree], home: Option<&Path>) -> Vec<String> {
    let width = worktrees
        .iter()
        .map(|wt| display_branch(wt).chars().count())
        .max()
        .unwrap_or(0);
    worktrees
        .iter()
        .map(|wt| {
            format!(
                "{:<width$}  {}",
                display_branch(wt),
                contract_home(&wt.path, home).display()
            )
        })
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> GwtError {
    GwtError::io("prompt failed", io::Error::other(e.to_string()))
}

fn select<T: std::fmt::Display>(prompt: &str, items: &[T]) -> Result<Option<usize>> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_on_opt(&Term::stderr())
        .map_err(prompt_error)
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact_on_opt(&Term::stderr())
        .map(|answer| answer.unwrap_or(false))
        .map_err(prompt_error)
}
