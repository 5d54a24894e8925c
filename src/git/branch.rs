use super::GitCommand;
use crate::error::GitError;
use std::path::Path;

impl GitCommand {
    /// Whether a local branch named `name` exists.
    pub fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        self.rev_parse_verify(&format!("refs/heads/{name}"))
    }

    /// Delete a local branch through an explicit git directory.
    ///
    /// A branch that does not exist is not an error. Without `force` git
    /// refuses to drop unmerged history (`-d`); with it, `-D` is used.
    pub fn delete_branch(&self, git_dir: &Path, name: &str, force: bool) -> Result<(), GitError> {
        if name.is_empty() {
            return Ok(());
        }

        // Run beside the git dir: the caller's cwd may be the worktree that
        // was just removed.
        let mut check = self.git_at(git_dir);
        check
            .arg("--git-dir")
            .arg(git_dir)
            .args(["show-ref", "--verify", "--quiet"])
            .arg(format!("refs/heads/{name}"));
        if !self.succeeds(&mut check)? {
            tracing::debug!(branch = name, "branch already gone, nothing to delete");
            return Ok(());
        }

        let mut cmd = self.git_at(git_dir);
        cmd.arg("--git-dir")
            .arg(git_dir)
            .arg("branch")
            .arg(if force { "-D" } else { "-d" })
            .arg(name);
        self.run(&mut cmd).map(drop)
    }

    /// Local branches whose history is contained in `base`.
    pub fn merged_branches(&self, base: &str) -> Result<Vec<String>, GitError> {
        let mut cmd = self.git();
        cmd.args(["branch", "--merged", base, "--format=%(refname:short)"]);
        Ok(self
            .run(&mut cmd)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
