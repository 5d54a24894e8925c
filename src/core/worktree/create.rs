//! Creating a worktree for a branch under the configured root.

use crate::core::ProgressSink;
use crate::error::{GwtError, Result};
use crate::git::GitCommand;
use crate::utils::validate_branch_name;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorktree {
    pub path: PathBuf,
    /// True when the branch already existed and was only checked out.
    pub existing_branch: bool,
}

/// Where the worktree for `branch` of `project` lives: `<root>/<project>/<branch>`.
///
/// Slashes in the branch name become nested directories.
pub fn worktree_path(root: &Path, project: &str, branch: &str) -> PathBuf {
    root.join(project).join(branch)
}

/// Create a worktree for `branch` at `target`.
///
/// An existing local branch is checked out as-is; otherwise a new branch is
/// created from `from`. Nothing is rolled back on failure: the parent
/// directory may remain.
pub fn create(
    git: &GitCommand,
    branch: &str,
    from: &str,
    target: &Path,
    sink: &mut dyn ProgressSink,
) -> Result<CreatedWorktree> {
    validate_branch_name(branch)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            GwtError::io(
                format!("failed to create parent directory {}", parent.display()),
                e,
            )
        })?;
    }

    let wrap = |source| GwtError::Create {
        branch: branch.to_string(),
        source,
    };

    let existing_branch = git.branch_exists(branch).map_err(wrap)?;
    if existing_branch {
        sink.on_step(&format!("Checking out existing branch '{branch}'"));
        git.worktree_add(target, branch).map_err(wrap)?;
    } else {
        sink.on_step(&format!("Creating branch '{branch}' from '{from}'"));
        git.worktree_add_new_branch(target, branch, from)
            .map_err(wrap)?;
    }

    Ok(CreatedWorktree {
        path: target.to_path_buf(),
        existing_branch,
    })
}
