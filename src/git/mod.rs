//! Thin wrappers around the `git` executable.
//!
//! Every method spawns one git process with a fixed argument vector and
//! turns its exit status and output into a typed result. Nothing here keeps
//! repository state except the cached shared git directory.

use crate::error::GitError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;

mod branch;
mod refs;
mod remote;
mod worktree;

pub use remote::project_name_from_url;
pub use worktree::{parse_porcelain, Worktree};

/// Branches probed, in order, when `origin/HEAD` is not set.
pub const DEFAULT_BRANCH_CANDIDATES: &[&str] = &["main", "master", "develop"];

/// Last-resort default branch name.
pub const FALLBACK_DEFAULT_BRANCH: &str = "main";

pub struct GitCommand {
    pub(crate) quiet: bool,
    pub(crate) work_dir: Option<PathBuf>,
    pub(crate) common_dir: OnceLock<PathBuf>,
}

impl GitCommand {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            work_dir: None,
            common_dir: OnceLock::new(),
        }
    }

    /// Run repository-relative commands from `dir` instead of the process
    /// working directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Directory repository-relative commands run from.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// A `git` command rooted at the configured working directory.
    pub(crate) fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    /// A `git` command rooted at an explicit directory.
    pub(crate) fn git_at(&self, dir: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Run to completion and return stdout, failing on a non-zero exit.
    pub(crate) fn run(&self, cmd: &mut Command) -> Result<String, GitError> {
        let output = self.spawn(cmd)?;
        if !output.status.success() {
            return Err(failure(cmd, &output));
        }
        String::from_utf8(output.stdout).map_err(|e| GitError::Parse {
            command: describe(cmd),
            detail: e.to_string(),
        })
    }

    /// Run to completion and report only whether git exited successfully.
    pub(crate) fn succeeds(&self, cmd: &mut Command) -> Result<bool, GitError> {
        Ok(self.spawn(cmd)?.status.success())
    }

    fn spawn(&self, cmd: &mut Command) -> Result<Output, GitError> {
        let command = describe(cmd);
        tracing::debug!(%command, "running git");
        let output = cmd
            .output()
            .map_err(|source| GitError::Spawn { command, source })?;
        if !output.status.success() {
            tracing::debug!(
                command = %describe(cmd),
                code = ?output.status.code(),
                "git exited unsuccessfully"
            );
        }
        Ok(output)
    }
}

fn failure(cmd: &Command, output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() {
        stdout.into_owned()
    } else {
        stderr.into_owned()
    };
    GitError::Failed {
        command: describe(cmd),
        code: output.status.code(),
        output: text,
    }
}

/// Render a command as a shell-like string for error messages.
pub(crate) fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    if let Some(dir) = cmd.get_current_dir() {
        parts.push("-C".to_string());
        parts.push(dir.display().to_string());
    }
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_command_new() {
        let git = GitCommand::new(true);
        assert!(git.quiet);
        assert!(git.work_dir().is_none());

        let git = GitCommand::new(false);
        assert!(!git.quiet);
    }

    #[test]
    fn test_git_command_in_dir() {
        let git = GitCommand::new(false).in_dir("/tmp/repo");
        assert_eq!(git.work_dir(), Some(Path::new("/tmp/repo")));
    }

    #[test]
    fn test_describe_includes_dir_and_args() {
        let git = GitCommand::new(false);
        let mut cmd = git.git_at(Path::new("/srv/main"));
        cmd.args(["worktree", "list", "--porcelain"]);
        assert_eq!(describe(&cmd), "git -C /srv/main worktree list --porcelain");
    }

    #[test]
    fn test_describe_without_dir() {
        let git = GitCommand::new(false);
        let mut cmd = git.git();
        cmd.args(["remote", "get-url", "origin"]);
        assert_eq!(describe(&cmd), "git remote get-url origin");
    }
}
