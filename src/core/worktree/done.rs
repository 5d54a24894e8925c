//! Finishing a branch: update the base branch, then remove the worktree.

use super::remove::{remove_with_branch_cleanup, RemovedWorktree};
use crate::core::ProgressSink;
use crate::error::{GwtError, Result};
use crate::git::GitCommand;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneResult {
    /// Where the shell should land afterwards: the base branch's worktree,
    /// or the main worktree when the base is not checked out anywhere.
    pub base_path: PathBuf,
    pub used_base_worktree: bool,
    pub removed: RemovedWorktree,
}

/// Fast-forward `base` and remove the worktree for `branch`.
///
/// With a worktree on `base`, runs `pull --ff-only` inside it. Otherwise
/// fast-forwards the local `base` ref with `fetch origin base:base` from the
/// main worktree. Any update failure aborts before the removal.
pub fn update_base_then_remove(
    git: &GitCommand,
    branch: &str,
    base: &str,
    sink: &mut dyn ProgressSink,
) -> Result<DoneResult> {
    if branch == base {
        return Err(GwtError::Conflict(format!(
            "refusing to remove base branch '{base}'"
        )));
    }

    let (base_path, used_base_worktree) = match git.find_worktree_for_branch(base)? {
        Some(path) => {
            sink.on_step(&format!(
                "Updating base branch in worktree: {}",
                path.display()
            ));
            git.pull_ff_only(&path)?;
            (path, true)
        }
        None => {
            let main = git.main_worktree()?;
            sink.on_step(&format!(
                "No base worktree checked out; fast-forwarding local ref in {}",
                main.display()
            ));
            git.fetch_into_local(&main, base)?;
            (main, false)
        }
    };

    let removed = remove_with_branch_cleanup(git, branch, false, sink)?;

    Ok(DoneResult {
        base_path,
        used_base_worktree,
        removed,
    })
}
