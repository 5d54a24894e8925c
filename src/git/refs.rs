use super::GitCommand;
use crate::error::GitError;
use std::path::{Path, PathBuf};

impl GitCommand {
    /// The shared git directory of the repository, as an absolute path.
    ///
    /// Resolved once and cached: later calls keep working after the current
    /// worktree has been removed from disk.
    pub fn common_dir(&self) -> Result<PathBuf, GitError> {
        if let Some(dir) = self.common_dir.get() {
            return Ok(dir.clone());
        }
        let mut cmd = self.git();
        cmd.args(["rev-parse", "--git-common-dir"]);
        let raw = self.run(&mut cmd)?;
        let base = match &self.work_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| GitError::Parse {
                command: super::describe(&cmd),
                detail: format!("cannot resolve relative git dir: {e}"),
            })?,
        };
        let dir = absolutize(&base, raw.trim());
        // Another caller may have raced us; either value is the same directory.
        let _ = self.common_dir.set(dir);
        Ok(self.common_dir.get().cloned().unwrap_or_default())
    }

    /// The primary checkout: the parent of the shared git directory.
    pub fn main_worktree(&self) -> Result<PathBuf, GitError> {
        let common = self.common_dir()?;
        common
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::Parse {
                command: "git rev-parse --git-common-dir".to_string(),
                detail: format!("'{}' has no parent directory", common.display()),
            })
    }

    /// The shared git directory of the worktree at `path`.
    ///
    /// Requires the worktree to still exist on disk.
    pub fn common_git_dir(&self, path: &Path) -> Result<PathBuf, GitError> {
        let mut cmd = self.git_at(path);
        cmd.args(["rev-parse", "--git-common-dir"]);
        let raw = self.run(&mut cmd)?;
        Ok(absolutize(path, raw.trim()))
    }

    /// Branch checked out in `dir` (`HEAD` when detached).
    pub fn current_branch_in(&self, dir: &Path) -> Result<String, GitError> {
        let mut cmd = self.git_at(dir);
        cmd.args(["rev-parse", "--abbrev-ref", "HEAD"]);
        Ok(self.run(&mut cmd)?.trim().to_string())
    }

    /// Abbreviated commit id checked out in `dir`.
    pub fn short_head_in(&self, dir: &Path) -> Result<String, GitError> {
        let mut cmd = self.git_at(dir);
        cmd.args(["rev-parse", "--short", "HEAD"]);
        Ok(self.run(&mut cmd)?.trim().to_string())
    }

    /// Whether `rev` resolves to an object.
    pub fn rev_parse_verify(&self, rev: &str) -> Result<bool, GitError> {
        let mut cmd = self.git();
        cmd.args(["rev-parse", "--verify", "--quiet", rev]);
        self.succeeds(&mut cmd)
    }
}

/// Resolve git's (possibly relative) directory output against `base`.
fn absolutize(base: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    let joined = if path.is_absolute() {
        path
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}
