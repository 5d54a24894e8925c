//! Error taxonomy shared by the gateway, the lifecycle manager and the
//! orchestrator.
//!
//! Core functions return [`GwtError`]; the command layer wraps these in
//! `anyhow` with additional context.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single git subprocess.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git executable could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// git ran and exited unsuccessfully.
    #[error("`{command}` {}: {}", exit_label(.code), .output.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// git produced output that could not be interpreted.
    #[error("unexpected output from `{command}`: {detail}")]
    Parse { command: String, detail: String },
}

impl GitError {
    /// The git command line that failed.
    pub fn command(&self) -> &str {
        match self {
            GitError::Spawn { command, .. }
            | GitError::Failed { command, .. }
            | GitError::Parse { command, .. } => command,
        }
    }

    /// Captured stdout/stderr of the failed command (empty for spawn errors).
    pub fn output(&self) -> &str {
        match self {
            GitError::Failed { output, .. } => output,
            _ => "",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Errors produced by worktree operations.
#[derive(Debug, Error)]
pub enum GwtError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// `git worktree add` failed for the requested branch.
    #[error("failed to create worktree for '{branch}': {source}")]
    Create {
        branch: String,
        #[source]
        source: GitError,
    },

    /// No worktree is checked out on the requested branch.
    #[error("worktree for branch '{0}' not found")]
    NotFound(String),

    /// The operation would remove a protected branch or combines incompatible options.
    #[error("{0}")]
    Conflict(String),

    /// The configuration document could not be parsed or written.
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setup command exited unsuccessfully.
    #[error("failed to run '{command}' ({}){}", exit_label(.code), output_suffix(.output))]
    SetupCommand {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// A copy pattern is not a valid glob.
    #[error("invalid copy pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A literal copy pattern that is absolute or climbs out with `..`.
    #[error("copy pattern '{0}' must stay inside the worktree")]
    EscapingPath(String),

    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranch { name: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

fn output_suffix(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nOutput: {trimmed}")
    }
}

impl GwtError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GwtError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = GwtError> = std::result::Result<T, E>;
