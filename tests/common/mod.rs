//! Throwaway repositories for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A repository `app` with one commit on `main`, pushed to a bare `origin`.
pub struct Fixture {
    _tmp: TempDir,
    pub base: PathBuf,
    pub repo: PathBuf,
    pub root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        // git reports resolved paths; compare against the same.
        let base = tmp.path().canonicalize().unwrap();
        let origin = base.join("remote").join("app.git");
        let repo = base.join("app");
        let root = base.join("worktrees");

        fs::create_dir_all(&origin).unwrap();
        git(&origin, &["init", "--bare", "-b", "main"]);
        fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "-b", "main"]);
        git(&repo, &["config", "user.name", "Test User"]);
        git(&repo, &["config", "user.email", "test@example.com"]);
        git(&repo, &["config", "commit.gpgsign", "false"]);
        fs::write(repo.join("README.md"), "app\n").unwrap();
        git(&repo, &["add", "README.md"]);
        git(&repo, &["commit", "-m", "initial"]);
        git(&repo, &["remote", "add", "origin", &origin.display().to_string()]);
        git(&repo, &["push", "-u", "origin", "main"]);

        Self {
            _tmp: tmp,
            base,
            repo,
            root,
        }
    }

    /// Add a linked worktree for a new branch `branch` under the root.
    pub fn add_worktree(&self, branch: &str) -> PathBuf {
        let path = self.root.join("app").join(branch);
        git(
            &self.repo,
            &["worktree", "add", "-b", branch, &path.display().to_string(), "main"],
        );
        path
    }

    /// Write `.worktree.yaml` into the main checkout with the root pointing
    /// inside the fixture.
    pub fn write_config(&self, copy: &[&str], setup: &[&str]) {
        let list = |items: &[&str]| {
            if items.is_empty() {
                " []\n".to_string()
            } else {
                items.iter().map(|i| format!("\n  - {i}")).collect::<String>() + "\n"
            }
        };
        let text = format!(
            concat!(
                "version: 1\ncopy:{}setup:{}settings:\n",
                "  root: {}\n  auto_clean_merged: true\n  confirm_delete: false\n",
            ),
            list(copy),
            list(setup),
            self.root.display()
        );
        fs::write(self.repo.join(".worktree.yaml"), text).unwrap();
    }
}

/// Run git in `dir`, panicking with its output on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn branch_exists(repo: &Path, branch: &str) -> bool {
    Command::new("git")
        .current_dir(repo)
        .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .status()
        .unwrap()
        .success()
}
