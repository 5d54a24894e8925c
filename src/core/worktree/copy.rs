//! Copying untracked files (env files, local config) into a new worktree.
//!
//! Each entry in `copy` is either a path relative to the source checkout or
//! a glob, applied in the order listed. Plain paths that do not exist are
//! skipped. Directories are merged into an existing destination directory
//! rather than nested inside it.

use crate::error::{GwtError, Result};
use globset::{GlobBuilder, GlobMatcher};
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// Whether `pattern` should be matched as a glob rather than a literal path.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_CHARS)
}

/// Copy every entry of `patterns` from `src_root` into `dest_root`, in
/// order, so a later entry overwrites what an earlier one wrote.
///
/// Returns the number of files written.
pub fn copy_files(src_root: &Path, dest_root: &Path, patterns: &[String]) -> Result<usize> {
    let mut copied = 0;
    for pattern in patterns {
        copied += if is_glob(pattern) {
            copy_glob(src_root, dest_root, pattern)?
        } else {
            copy_literal(src_root, dest_root, pattern)?
        };
    }
    Ok(copied)
}

fn copy_literal(src_root: &Path, dest_root: &Path, pattern: &str) -> Result<usize> {
    let rel = Path::new(pattern);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(GwtError::EscapingPath(pattern.to_string()));
    }

    // "" and "." would copy the whole checkout.
    if rel.components().all(|c| c == Component::CurDir) {
        return Ok(0);
    }

    let src = src_root.join(rel);
    let dest = dest_root.join(rel);
    let meta = match fs::metadata(&src) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %src.display(), "copy source missing, skipping");
            return Ok(0);
        }
        Err(e) => {
            return Err(GwtError::io(format!("failed to stat {}", src.display()), e));
        }
    };

    if meta.is_dir() {
        copy_dir_merge(&src, &dest)
    } else {
        copy_file(&src, &dest)?;
        Ok(1)
    }
}

fn copy_glob(src_root: &Path, dest_root: &Path, pattern: &str) -> Result<usize> {
    // `*` stays within one directory; `**` crosses them.
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| GwtError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();
    if !src_root.is_dir() {
        return Ok(0);
    }
    copy_matching(src_root, dest_root, &matcher)
}

/// A walker that sees every file: hidden ones and ignored ones included,
/// since env files are usually both.
fn walker(root: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != ".git");
    builder
}

fn walk_error(root: &Path, err: ignore::Error) -> GwtError {
    GwtError::io(
        format!("failed to walk {}", root.display()),
        io::Error::other(err.to_string()),
    )
}

fn copy_matching(src_root: &Path, dest_root: &Path, matcher: &GlobMatcher) -> Result<usize> {
    let mut copied = 0;
    for entry in walker(src_root).build() {
        let entry = entry.map_err(|e| walk_error(src_root, e))?;
        if is_dir(&entry) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        if matcher.is_match(rel) {
            copy_entry(&entry, &dest_root.join(rel))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Recursively copy `src` into `dest`, merging with whatever `dest` holds.
fn copy_dir_merge(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in walker(src).build() {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if is_dir(&entry) {
            create_dir(&target)?;
        } else {
            copy_entry(&entry, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_dir())
}

fn copy_entry(entry: &DirEntry, dest: &Path) -> Result<()> {
    let is_symlink = entry.file_type().is_some_and(|t| t.is_symlink());
    if is_symlink {
        copy_symlink(entry.path(), dest)
    } else {
        copy_file(entry.path(), dest)
    }
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        create_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|e| {
        GwtError::io(
            format!("failed to copy {} to {}", src.display(), dest.display()),
            e,
        )
    })?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let link: PathBuf = fs::read_link(src)
        .map_err(|e| GwtError::io(format!("failed to read link {}", src.display()), e))?;
    if let Some(parent) = dest.parent() {
        create_dir(parent)?;
    }
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest)
            .map_err(|e| GwtError::io(format!("failed to replace {}", dest.display()), e))?;
    }
    std::os::unix::fs::symlink(&link, dest)
        .map_err(|e| GwtError::io(format!("failed to link {}", dest.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    copy_file(src, dest)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| GwtError::io(format!("failed to create directory {}", path.display()), e))
}
