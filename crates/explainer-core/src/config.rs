use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use crate::jobs::{JobPolicy, PacingPolicy, RetryPolicy};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory (~/.local/share/slide-explainer)
    pub data_dir: PathBuf,
    /// Uploaded decks, one file per job
    pub uploads_dir: PathBuf,
    /// Finished job artifacts
    pub outputs_dir: PathBuf,
    /// User settings file
    pub settings_file: PathBuf,
}

impl Config {
    /// Load configuration or use defaults
    pub fn load_or_default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slide-explainer");
        Self::with_data_dir(data_dir)
    }

    /// Configuration rooted at an explicit data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            uploads_dir: data_dir.join("uploads"),
            outputs_dir: data_dir.join("outputs"),
            settings_file: data_dir.join("settings.json"),
            data_dir,
        }
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.uploads_dir)?;
        std::fs::create_dir_all(&self.outputs_dir)?;
        Ok(())
    }
}

/// User-adjustable settings, persisted as JSON.
///
/// Every field has a default, so partial or missing files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry: RetryPolicy,
    pub pacing: PacingPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryPolicy::default(),
            pacing: PacingPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read settings {:?}: {}", path, e);
                return Self::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Invalid settings file {:?}, using defaults: {}", path, e);
            Self::default()
        })
    }

    /// Write settings to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Client configuration for these settings and the given key.
    pub fn client_config(&self, api_key: impl Into<String>) -> ClientConfig {
        ClientConfig {
            api_key: api_key.into(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub fn job_policy(&self) -> JobPolicy {
        JobPolicy {
            retry: self.retry,
            pacing: self.pacing,
        }
    }
}
