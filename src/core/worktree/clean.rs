//! Removing worktrees whose branches are merged into the default branch.

use super::remove::{remove_with_branch_cleanup, RemovedWorktree};
use crate::config::Config;
use crate::core::ProgressSink;
use crate::error::{GwtError, Result};
use crate::git::GitCommand;
use std::collections::HashSet;

/// Branch names never removed by [`clean_merged`], besides the default branch.
const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

#[derive(Debug, Default)]
pub struct CleanReport {
    pub base: String,
    pub removed: Vec<RemovedWorktree>,
    /// Worktrees that could not be removed, by branch.
    pub failed: Vec<(String, GwtError)>,
}

/// Remove every linked worktree whose branch is merged into the default
/// branch.
///
/// Each removal is independent: a failure is recorded and the rest still
/// run. The main worktree and protected branches are never touched.
pub fn clean_merged(
    git: &GitCommand,
    config: &Config,
    sink: &mut dyn ProgressSink,
) -> Result<CleanReport> {
    if !config.settings.auto_clean_merged {
        return Err(GwtError::Conflict(
            "auto clean is disabled in config (settings.auto_clean_merged)".to_string(),
        ));
    }

    let base = git.default_branch();
    let merged: HashSet<String> = git.merged_branches(&base)?.into_iter().collect();
    let main = git.main_worktree()?;
    tracing::debug!(%base, merged = merged.len(), "collected merged branches");

    let candidates: Vec<String> = git
        .list_worktrees()?
        .into_iter()
        .filter(|wt| !wt.branch.is_empty() && wt.path != main)
        .filter(|wt| wt.branch != base && !PROTECTED_BRANCHES.contains(&wt.branch.as_str()))
        .filter(|wt| merged.contains(&wt.branch))
        .map(|wt| wt.branch)
        .collect();

    let mut report = CleanReport {
        base,
        ..CleanReport::default()
    };
    for branch in candidates {
        sink.on_step(&format!("Removing merged worktree: {branch}"));
        match remove_with_branch_cleanup(git, &branch, false, sink) {
            Ok(removed) => report.removed.push(removed),
            Err(e) => report.failed.push((branch, e)),
        }
    }

    Ok(report)
}
