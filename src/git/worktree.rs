use super::GitCommand;
use crate::error::GitError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One checked-out working copy, as reported by `git worktree list`.
///
/// This is a snapshot: after any mutation the list must be fetched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worktree {
    pub path: PathBuf,
    /// Branch name without `refs/heads/`; empty for a detached checkout.
    pub branch: String,
    pub head: String,
}

/// Parse the output of `git worktree list --porcelain`.
///
/// Each record has the form:
/// ```text
/// worktree /path/to/worktree
/// HEAD <sha>
/// branch refs/heads/branch-name
/// ```
/// A `worktree` line starts a new record. Records without a `branch` line
/// (detached or bare) keep an empty branch.
pub fn parse_porcelain(output: &str) -> Vec<Worktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<Worktree> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            current = Some(Worktree {
                path: PathBuf::from(path),
                branch: String::new(),
                head: String::new(),
            });
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            if let Some(wt) = current.as_mut() {
                wt.branch = branch_ref
                    .strip_prefix("refs/heads/")
                    .unwrap_or(branch_ref)
                    .to_string();
            }
        } else if let Some(head) = line.strip_prefix("HEAD ") {
            if let Some(wt) = current.as_mut() {
                wt.head = head.to_string();
            }
        }
    }
    if let Some(done) = current.take() {
        worktrees.push(done);
    }

    worktrees
}

impl GitCommand {
    /// List every worktree of the repository.
    ///
    /// Runs from the main worktree so it keeps working when invoked from a
    /// worktree that is about to be (or has just been) removed.
    pub fn list_worktrees(&self) -> Result<Vec<Worktree>, GitError> {
        let main = self.main_worktree()?;
        let mut cmd = self.git_at(&main);
        cmd.args(["worktree", "list", "--porcelain"]);
        Ok(parse_porcelain(&self.run(&mut cmd)?))
    }

    /// Find the worktree checked out on `branch`.
    pub fn find_worktree_for_branch(&self, branch: &str) -> Result<Option<PathBuf>, GitError> {
        if branch.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list_worktrees()?
            .into_iter()
            .find(|wt| wt.branch == branch)
            .map(|wt| wt.path))
    }

    /// Attach a new worktree at `path` to the existing `branch`.
    pub fn worktree_add(&self, path: &Path, branch: &str) -> Result<(), GitError> {
        let mut cmd = self.git();
        cmd.args(["worktree", "add"]);
        if self.quiet {
            cmd.arg("--quiet");
        }
        cmd.arg(path).arg(branch);
        self.run(&mut cmd).map(drop)
    }

    /// Create `new_branch` from `base_branch` and check it out at `path`.
    pub fn worktree_add_new_branch(
        &self,
        path: &Path,
        new_branch: &str,
        base_branch: &str,
    ) -> Result<(), GitError> {
        let mut cmd = self.git();
        cmd.args(["worktree", "add"]);
        if self.quiet {
            cmd.arg("--quiet");
        }
        cmd.arg("-b").arg(new_branch).arg(path).arg(base_branch);
        self.run(&mut cmd).map(drop)
    }

    /// Remove the worktree at `path`, operating from the main worktree.
    pub fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), GitError> {
        let main = self.main_worktree()?;
        let mut cmd = self.git_at(&main);
        cmd.args(["worktree", "remove"]);
        if force {
            cmd.arg("--force");
        }
        cmd.arg(path);
        self.run(&mut cmd).map(drop)
    }
}
