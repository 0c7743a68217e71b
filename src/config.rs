use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "eunhad.json";
pub const DEFAULT_ADMIN_SECRET: &str = "0000";
pub const DEFAULT_STOP_SEARCH: &str = "검단신도시";
pub const DEFAULT_STOP_STORE_FILE: &str = "bus_stops.sqlite3";

/// Per-workspace settings read from `eunhad.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub admin_secret: String,
    /// Stop search term used when the user searches for nothing.
    pub default_stop_search: String,
    /// Relative paths resolve against the workspace directory.
    pub stop_store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_secret: DEFAULT_ADMIN_SECRET.to_string(),
            default_stop_search: DEFAULT_STOP_SEARCH.to_string(),
            stop_store_path: PathBuf::from(DEFAULT_STOP_STORE_FILE),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&content)?;
        Ok(cfg)
    }

    /// Best-effort load: a missing or unreadable file falls back to defaults.
    pub fn load_for_workspace(workspace: &Path) -> Self {
        let path = workspace.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded workspace config");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable workspace config");
                Self::default()
            }
        }
    }

    pub fn stop_store_path(&self, workspace: &Path) -> PathBuf {
        if self.stop_store_path.is_absolute() {
            self.stop_store_path.clone()
        } else {
            workspace.join(&self.stop_store_path)
        }
    }
}
