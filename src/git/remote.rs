use super::{GitCommand, DEFAULT_BRANCH_CANDIDATES, FALLBACK_DEFAULT_BRANCH};
use crate::error::GitError;
use std::path::Path;

const ORIGIN: &str = "origin";

impl GitCommand {
    /// URL of the remote named `remote`.
    pub fn remote_get_url(&self, remote: &str) -> Result<String, GitError> {
        let mut cmd = self.git();
        cmd.args(["remote", "get-url", remote]);
        Ok(self.run(&mut cmd)?.trim().to_string())
    }

    /// Project name derived from the `origin` URL.
    pub fn project_name(&self) -> Result<String, GitError> {
        let url = self.remote_get_url(ORIGIN)?;
        project_name_from_url(&url).ok_or_else(|| GitError::Parse {
            command: "git remote get-url origin".to_string(),
            detail: format!("cannot derive a project name from '{url}'"),
        })
    }

    /// The repository's default branch.
    ///
    /// Order: the remote's symbolic `HEAD`, then the first of
    /// [`DEFAULT_BRANCH_CANDIDATES`] present on the remote, then
    /// [`FALLBACK_DEFAULT_BRANCH`].
    pub fn default_branch(&self) -> String {
        let mut cmd = self.git();
        cmd.args(["symbolic-ref", &format!("refs/remotes/{ORIGIN}/HEAD")]);
        if let Ok(out) = self.run(&mut cmd) {
            if let Some(branch) = branch_from_remote_head(out.trim(), ORIGIN) {
                return branch;
            }
        }

        for candidate in DEFAULT_BRANCH_CANDIDATES {
            if let Ok(true) = self.rev_parse_verify(&format!("{ORIGIN}/{candidate}")) {
                return (*candidate).to_string();
            }
        }

        FALLBACK_DEFAULT_BRANCH.to_string()
    }

    /// `git pull --ff-only` inside `dir`.
    pub fn pull_ff_only(&self, dir: &Path) -> Result<(), GitError> {
        let mut cmd = self.git_at(dir);
        cmd.args(["pull", "--ff-only"]);
        if self.quiet {
            cmd.arg("--quiet");
        }
        self.run(&mut cmd).map(drop)
    }

    /// Fast-forward the local `branch` ref from origin without a checkout.
    pub fn fetch_into_local(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        let mut cmd = self.git_at(dir);
        cmd.args(["fetch", ORIGIN, &format!("{branch}:{branch}")]);
        if self.quiet {
            cmd.arg("--quiet");
        }
        self.run(&mut cmd).map(drop)
    }
}

/// Last path segment of a remote URL with any `.git` suffix removed.
///
/// Handles `https://host/org/repo.git`, `git@host:org/repo.git` and
/// `git@host:repo.git`.
pub fn project_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn branch_from_remote_head(symref: &str, remote: &str) -> Option<String> {
    let branch = symref.strip_prefix(&format!("refs/remotes/{remote}/"))?;
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}
