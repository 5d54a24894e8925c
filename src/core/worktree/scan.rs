//! Discovering worktrees of every project under a shared root directory.
//!
//! The root holds one directory per project; below that, worktrees may be
//! nested arbitrarily deep (branch names with slashes become nested
//! directories). A directory is a linked worktree exactly when it contains a
//! `.git` *file*. A `.git` directory marks a full clone, which is not
//! reported and not descended into.

use crate::config::{self, Config};
use crate::git::GitCommand;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Directories never descended into while looking for worktrees.
pub const BLOCKED_DIRS: &[&str] = &["node_modules", "vendor", "dist", "build", "target"];

/// A worktree found under the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootItem {
    pub project: String,
    pub branch: String,
    pub path: PathBuf,
    pub head: String,
}

/// Reads the checked-out branch and commit of a worktree directory.
pub trait WorktreeProbe {
    /// Branch name, `HEAD` when detached, or empty when unknown.
    fn branch(&self, dir: &Path) -> String;

    /// Abbreviated commit id, or empty when unknown.
    fn head(&self, dir: &Path) -> String;
}

impl WorktreeProbe for GitCommand {
    fn branch(&self, dir: &Path) -> String {
        self.current_branch_in(dir).unwrap_or_default()
    }

    fn head(&self, dir: &Path) -> String {
        self.short_head_in(dir).unwrap_or_default()
    }
}

/// Resolve the root to scan: an explicit override (with `~/` expanded) or
/// the configured root, made absolute against the current directory.
pub fn resolve_root(root_override: Option<&str>, config: &Config) -> PathBuf {
    let root = match root_override {
        Some(raw) if !raw.is_empty() => config::expand_home(raw, dirs::home_dir().as_deref()),
        _ => config.settings.root.clone(),
    };
    if root.is_absolute() {
        root
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&root))
            .unwrap_or(root)
    }
}

/// Scan the resolved root, returning the inventory and the root used.
pub fn scan(
    root_override: Option<&str>,
    config: &Config,
    probe: &dyn WorktreeProbe,
) -> (Vec<RootItem>, PathBuf) {
    let root = resolve_root(root_override, config);
    let items = scan_root(&root, probe);
    (items, root)
}

/// Find every linked worktree below `root`, sorted by project then branch.
///
/// A missing or non-directory root yields an empty list. Unreadable
/// directories are skipped.
pub fn scan_root(root: &Path, probe: &dyn WorktreeProbe) -> Vec<RootItem> {
    let Ok(projects) = fs::read_dir(root) else {
        tracing::debug!(root = %root.display(), "root not readable, nothing to scan");
        return Vec::new();
    };

    let mut items = Vec::new();
    for entry in projects.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let project = entry.file_name().to_string_lossy().into_owned();
        scan_project(&project, &entry.path(), probe, &mut items);
    }

    items.sort_by(|a, b| (&a.project, &a.branch).cmp(&(&b.project, &b.branch)));
    items
}

fn scan_project(
    project: &str,
    project_dir: &Path,
    probe: &dyn WorktreeProbe,
    items: &mut Vec<RootItem>,
) {
    let mut stack = vec![project_dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if let Ok(meta) = fs::symlink_metadata(dir.join(".git")) {
            if !meta.is_dir() {
                items.push(record(project, project_dir, &dir, probe));
            }
            // Either a worktree or a full clone: nothing below is ours.
            continue;
        }

        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            // file_type() does not follow symlinks.
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || BLOCKED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            stack.push(entry.path());
        }
    }
}

fn record(project: &str, project_dir: &Path, dir: &Path, probe: &dyn WorktreeProbe) -> RootItem {
    let mut branch = probe.branch(dir);
    if branch.is_empty() || branch == "HEAD" {
        // Detached: fall back to the directory layout, which mirrors the
        // branch the worktree was created for.
        branch = relative_label(project_dir, dir);
    }
    RootItem {
        project: project.to_string(),
        branch,
        path: dir.to_path_buf(),
        head: probe.head(dir),
    }
}

/// Slash-separated path of `dir` relative to `project_dir`, or the full
/// path when `dir` is the project directory itself.
fn relative_label(project_dir: &Path, dir: &Path) -> String {
    match dir.strip_prefix(project_dir) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => dir.display().to_string(),
    }
}
