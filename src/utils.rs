use crate::error::{GwtError, Result};

/// Longest branch name accepted, in bytes.
const MAX_BRANCH_LEN: usize = 255;

/// Reject branch names that would escape the worktree root or confuse git.
///
/// Called before any filesystem mutation, since the branch name becomes a
/// path segment under `<root>/<project>/`.
pub fn validate_branch_name(branch_name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(GwtError::InvalidBranch {
            name: branch_name.to_string(),
            reason: reason.to_string(),
        })
    };

    if branch_name.is_empty() {
        return invalid("branch name cannot be empty");
    }

    // Path traversal
    if branch_name.contains("..") {
        return invalid("branch name cannot contain '..'");
    }

    if branch_name.starts_with('/') || branch_name.ends_with('/') {
        return invalid("branch name cannot start or end with '/'");
    }

    // Would be parsed as an option by git
    if branch_name.starts_with('-') {
        return invalid("branch name cannot start with '-'");
    }

    if branch_name.chars().any(|c| {
        c.is_control() || matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
    }) {
        return invalid("branch name contains control characters");
    }

    if branch_name.chars().any(char::is_whitespace) {
        return invalid("branch name cannot contain whitespace");
    }

    if branch_name.len() > MAX_BRANCH_LEN {
        return invalid("branch name too long (max 255 characters)");
    }

    Ok(())
}
