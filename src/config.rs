//! Per-repository configuration stored in `.worktree.yaml`.
//!
//! ```yaml
//! version: 1
//! copy:
//!   - .env
//!   - .env.local
//! setup:
//!   - npm install
//! settings:
//!   root: ~/git-worktrees
//!   auto_clean_merged: true
//!   confirm_delete: true
//! ```
//!
//! `settings.root` is kept portable on disk (`~/...`) and is always an
//! absolute path in memory.

use crate::error::{GwtError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".worktree.yaml";

/// Directory under the home directory used when no root is configured.
pub const DEFAULT_ROOT_DIR: &str = "git-worktrees";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    /// Paths or globs, relative to the source checkout, copied into new worktrees.
    pub copy: Vec<String>,
    /// Shell commands run inside a new worktree, in order.
    pub setup: Vec<String>,
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub root: PathBuf,
    pub auto_clean_merged: bool,
    pub confirm_delete: bool,
}

impl Config {
    /// The configuration written by `gwt init` and used when no file exists.
    pub fn starter() -> Self {
        Self {
            version: 1,
            copy: vec![".env".to_string(), ".env.local".to_string()],
            setup: vec!["npm install".to_string()],
            settings: Settings {
                root: PathBuf::from(format!("~/{DEFAULT_ROOT_DIR}")),
                auto_clean_merged: true,
                confirm_delete: true,
            },
        }
    }

    /// Load `.worktree.yaml` from `dir`, falling back to [`Config::starter`].
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_home(dir, dirs::home_dir().as_deref())
    }

    pub fn load_with_home(dir: &Path, home: Option<&Path>) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                let mut config = Self::starter();
                config.normalize_root(home);
                return Ok(config);
            }
            Err(e) => {
                return Err(GwtError::io(format!("failed to read {}", path.display()), e));
            }
        };

        let mut config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&text).map_err(|source| GwtError::Config {
                path: path.clone(),
                source,
            })?
        };

        let original = config.settings.root.clone();
        if config.normalize_root(home) {
            tracing::warn!(
                "Migrating config: {} → ~/{DEFAULT_ROOT_DIR}",
                original.display()
            );
            if let Err(e) = config.save_with_home(dir, home) {
                tracing::warn!("Could not save migrated config: {e}");
            }
        }

        Ok(config)
    }

    /// Write the configuration to `dir/.worktree.yaml` with a portable root.
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.save_with_home(dir, dirs::home_dir().as_deref())
    }

    pub fn save_with_home(&self, dir: &Path, home: Option<&Path>) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let mut portable = self.clone();
        portable.settings.root = contract_home(&self.settings.root, home);

        let text = serde_yaml::to_string(&portable).map_err(|source| GwtError::Config {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text)
            .map_err(|e| GwtError::io(format!("failed to write {}", path.display()), e))
    }

    /// Expand `settings.root` to an absolute path.
    ///
    /// Returns true when the stored root pointed into another user's home
    /// (`/home/<user>/git-worktrees...` or `/Users/<user>/git-worktrees...`)
    /// and was rewritten to the current home, meaning the file should be
    /// saved again.
    fn normalize_root(&mut self, home: Option<&Path>) -> bool {
        let Some(home) = home else {
            return false;
        };
        let root = self.settings.root.to_string_lossy().into_owned();

        if root.is_empty() {
            self.settings.root = home.join(DEFAULT_ROOT_DIR);
            return false;
        }
        if root.starts_with('~') {
            self.settings.root = expand_home(&root, Some(home));
            return false;
        }
        if let Some(rest) = foreign_home_suffix(&root) {
            if rest.starts_with(DEFAULT_ROOT_DIR) {
                self.settings.root = home.join(rest);
                return true;
            }
        }
        false
    }
}

/// Expand a leading `~` or `~/` against `home`.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) if path == "~" => home.to_path_buf(),
        Some(home) => match path.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

/// Rewrite a path under `home` as `~/...`.
pub fn contract_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from("~"),
        Ok(rest) => Path::new("~").join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// For `/home/<user>/<rest>` or `/Users/<user>/<rest>`, return `<rest>`.
fn foreign_home_suffix(root: &str) -> Option<&str> {
    let after = root
        .strip_prefix("/home/")
        .or_else(|| root.strip_prefix("/Users/"))?;
    let (_user, rest) = after.split_once('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}
