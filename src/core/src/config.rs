use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OlmError, Result};
use crate::log::LogConfig;

/// Registry used when a reference names no host.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Tag applied when a reference carries neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

/// olmoci configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlmConfig {
    /// Registry host for references without one
    pub default_registry: String,

    /// Tag for references without tag or digest
    pub default_tag: String,

    /// Registries reached over plain HTTP
    pub insecure_registries: Vec<String>,

    /// Logging
    pub log: LogConfig,
}

impl Default for OlmConfig {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            default_tag: DEFAULT_TAG.to_string(),
            insecure_registries: Vec::new(),
            log: LogConfig::default(),
        }
    }
}

impl OlmConfig {
    /// Default config location (`~/.olmoci/config.yaml`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".olmoci"))
            .unwrap_or_else(|| PathBuf::from(".olmoci"))
            .join("config.yaml")
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            OlmError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: OlmConfig = serde_yaml::from_str(&data).map_err(|e| {
            OlmError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    tracing::debug!(path = %default.display(), "Loading configuration");
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_registry.trim().is_empty() {
            return Err(OlmError::ConfigError(
                "default_registry must not be empty".to_string(),
            ));
        }
        if self.default_tag.trim().is_empty() {
            return Err(OlmError::ConfigError(
                "default_tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `registry` should be reached over plain HTTP.
    pub fn is_insecure(&self, registry: &str) -> bool {
        self.insecure_registries
            .iter()
            .any(|r| r.eq_ignore_ascii_case(registry))
    }
}
