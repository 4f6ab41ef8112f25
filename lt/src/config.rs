//! Configuration for labeltool

use eyre::{Context, Result};
use labelstore::BackendKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::progress::DEFAULT_TUTORIAL_SKIP;
use crate::session::SessionSettings;

/// Main labeltool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Tutorial configuration
    pub tutorial: TutorialConfig,
}

/// Where the catalog and the state rows live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type: sqlite or files
    pub backend: BackendKind,

    /// Database file (sqlite) or data directory (files)
    pub path: Option<PathBuf>,

    /// Fixed id of the cursor row
    #[serde(rename = "state-row-id")]
    pub state_row_id: i64,

    /// Fixed id of the annotation row
    #[serde(rename = "annotations-row-id")]
    pub annotations_row_id: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            state_row_id: labelstore::DEFAULT_STATE_ROW_ID,
            annotations_row_id: labelstore::DEFAULT_ANNOTATIONS_ROW_ID,
        }
    }
}

impl StorageConfig {
    /// Configured path, or the per-backend default under the data dir
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("labeltool");
        match self.backend {
            BackendKind::Sqlite => base.join("labeltool.db"),
            BackendKind::Files => base.join("data"),
        }
    }
}

/// Tutorial configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Report index the cursor jumps to when the tutorial is dismissed
    #[serde(rename = "skip-offset")]
    pub skip_offset: usize,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            skip_offset: DEFAULT_TUTORIAL_SKIP,
        }
    }
}

impl Config {
    /// Config files to try, in priority order
    ///
    /// An explicit path is the only candidate. Otherwise the project-local
    /// `.labeltool.yml` comes first, then `~/.config/labeltool/labeltool.yml`.
    fn candidates(config_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = config_path {
            return vec![path.clone()];
        }
        let mut paths = vec![PathBuf::from(".labeltool.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("labeltool").join("labeltool.yml"));
        }
        paths
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit config path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates(None).iter().filter(|p| p.exists()) {
            match Self::load_from_file(candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Peek at the log level before logging is set up
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::candidates(config_path)
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| {
                fs::read_to_string(p)
                    .ok()
                    .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            })
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            state_row_id: self.storage.state_row_id,
            annotations_row_id: self.storage.annotations_row_id,
            tutorial_skip: self.tutorial.skip_offset,
        }
    }
}
