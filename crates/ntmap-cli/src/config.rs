//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const COLLECTION_ENV: &str = "NTMAP_COLLECTION";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Collection used when `--collection` is not given
    #[serde(default)]
    pub collection_path: Option<PathBuf>,
    /// Accept one-way sync warnings without prompting
    #[serde(default)]
    pub auto_confirm_schema_change: bool,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("ntmap").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn default_collection_path() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join("ntmap").join("collection.db"))
        .ok_or_else(|| "Failed to resolve CLI data directory".to_string())
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Pick the collection: explicit flag, then environment, then config, then default
    pub fn resolve_collection_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf, String> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        let from_env = normalize_text_option(std::env::var(COLLECTION_ENV).ok());
        if let Some(path) = from_env {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.collection_path {
            return Ok(path.clone());
        }
        default_collection_path()
    }

    fn normalize(&mut self) {
        if self.version == 0 {
            self.version = default_config_version();
        }
        self.collection_path = normalize_text_option(
            self.collection_path
                .take()
                .map(|path| path.to_string_lossy().into_owned()),
        )
        .map(PathBuf::from);
    }
}

pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    ntmap_core::util::normalize_text_option(value)
}
