//! Editor configuration, loaded from YAML.
//!
//! ```yaml
//! project_name: bracket
//! history:
//!   merge_window_ms: 500
//!   max_undos: 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub project_name: String,
    pub history: HistoryConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            history: HistoryConfig::default(),
        }
    }
}

fn default_project_name() -> String {
    "untitled".to_string()
}

/// History stack tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Two updatable commands on the same target merge when issued within this window.
    pub merge_window_ms: u64,
    /// Oldest undo entries are dropped beyond this depth. `None` keeps everything.
    /// `0` is rejected when loading; a history built with it directly keeps
    /// everything.
    pub max_undos: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            merge_window_ms: 500,
            max_undos: None,
        }
    }
}

impl HistoryConfig {
    pub fn merge_window(&self) -> Duration {
        Duration::from_millis(self.merge_window_ms)
    }
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        info!(path = %path.display(), "loaded editor config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        if config.history.max_undos == Some(0) {
            return Err(ConfigError::Invalid(
                "history.max_undos must be at least 1 (omit it for no limit)".into(),
            ));
        }
        Ok(config)
    }
}
