//! Removing worktrees, optionally together with their branch.

use crate::core::ProgressSink;
use crate::error::{GitError, GwtError, Result};
use crate::git::GitCommand;
use std::path::{Path, PathBuf};

/// Fragments of git's refusal to remove a worktree with local changes.
const DIRTY_REFUSAL_MARKERS: &[&str] = &[
    "contains modified or untracked files",
    "use --force",
    "is not clean",
];

/// Result of [`remove_with_branch_cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedWorktree {
    pub branch: String,
    pub path: PathBuf,
    /// False when the worktree was removed but its branch was kept.
    pub branch_deleted: bool,
}

/// Remove the worktree at `path`. git runs from the main worktree, so the
/// current directory may be the worktree being removed.
pub fn remove(git: &GitCommand, path: &Path, force: bool) -> Result<()> {
    git.worktree_remove(path, force)?;
    Ok(())
}

/// Whether `err` is git refusing to remove a worktree with local changes.
///
/// Callers use this to offer a retry with `force`.
pub fn is_dirty_refusal(err: &GwtError) -> bool {
    match err {
        GwtError::Git(git_err @ GitError::Failed { .. }) => {
            let text = git_err.output().to_lowercase();
            DIRTY_REFUSAL_MARKERS.iter().any(|m| text.contains(m))
        }
        _ => false,
    }
}

/// Remove the worktree checked out on `branch`, then delete the branch.
///
/// The shared git directory is captured before removal because the
/// worktree's own `.git` file disappears with it. Branch deletion uses the
/// safe `-d`; its failure (unmerged history) is reported as a warning and
/// does not fail the removal.
pub fn remove_with_branch_cleanup(
    git: &GitCommand,
    branch: &str,
    force: bool,
    sink: &mut dyn ProgressSink,
) -> Result<RemovedWorktree> {
    let path = git
        .find_worktree_for_branch(branch)?
        .ok_or_else(|| GwtError::NotFound(branch.to_string()))?;

    let git_dir = match git.common_git_dir(&path) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::debug!(error = %e, "falling back to the current repository's git dir");
            git.common_dir()?
        }
    };

    sink.on_step(&format!("Removing worktree {}", path.display()));
    remove(git, &path, force)?;

    let branch_deleted = match git.delete_branch(&git_dir, branch, false) {
        Ok(()) => true,
        Err(e) => {
            sink.on_warning(&format!(
                "worktree removed but branch '{branch}' was kept: {}",
                e.output().trim()
            ));
            false
        }
    };

    Ok(RemovedWorktree {
        branch: branch.to_string(),
        path,
        branch_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(output: &str) -> GwtError {
        GwtError::Git(GitError::Failed {
            command: "git worktree remove /wt/x".to_string(),
            code: Some(128),
            output: output.to_string(),
        })
    }

    #[test]
    fn test_is_dirty_refusal_modified_files() {
        assert!(is_dirty_refusal(&failed(
            "fatal: '/wt/x' contains modified or untracked files, use --force to delete it"
        )));
    }

    #[test]
    fn test_is_dirty_refusal_not_clean() {
        assert!(is_dirty_refusal(&failed("fatal: '/wt/x' is not clean")));
    }

    #[test]
    fn test_is_dirty_refusal_other_failures() {
        assert!(!is_dirty_refusal(&failed("fatal: '/wt/x' is a main working tree")));
        assert!(!is_dirty_refusal(&GwtError::NotFound("x".to_string())));
        assert!(!is_dirty_refusal(&GwtError::Conflict(
            "use --force".to_string()
        )));
    }
}
