use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub const DEFAULT_CONFIG_DIR_NAME: &str = ".autowork";
const CONFIG_FILE_NAME: &str = "config.json";
const STATE_FILE_NAME: &str = "state.json";
const SESSIONS_FILE_NAME: &str = "sessions.json";
const ACTIVE_SESSIONS_DIR_NAME: &str = "active_sessions";

/// Resolves the config directory from an explicit override or `$HOME/.autowork`.
pub fn resolve_config_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        return Ok(dir.to_path_buf());
    }
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("unable to resolve home directory; pass --config-dir"))?;
    Ok(home.join(DEFAULT_CONFIG_DIR_NAME))
}

/// File layout of one Autowork config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoworkPaths {
    root: PathBuf,
}

impl AutoworkPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE_NAME)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.root.join(SESSIONS_FILE_NAME)
    }

    /// Directory holding per-session prompt and log files.
    pub fn active_sessions_dir(&self) -> PathBuf {
        self.root.join(ACTIVE_SESSIONS_DIR_NAME)
    }
}
