//! Persistent registry credentials.
//!
//! Credentials live in `~/.olmoci/auth/credentials.json`, keyed by
//! normalized registry host. Writes go to a temporary file which is then
//! renamed over the original.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use olmoci_core::error::{OlmError, Result};
use serde::{Deserialize, Serialize};

/// Username and password for one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    registries: BTreeMap<String, Credential>,
}

/// File-backed credential store.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `~/.olmoci/auth/credentials.json`.
    pub fn default_path() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            OlmError::ConfigError("Cannot determine home directory for credential store".to_string())
        })?;
        Ok(Self::new(home.join(".olmoci").join("auth").join("credentials.json")))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save credentials for `registry`, replacing any existing entry.
    pub fn store(&self, registry: &str, credential: Credential) -> Result<()> {
        let mut file = self.load()?;
        file.registries.insert(normalize_registry(registry), credential);
        self.save(&file)
    }

    pub fn get(&self, registry: &str) -> Result<Option<Credential>> {
        Ok(self.load()?.registries.remove(&normalize_registry(registry)))
    }

    /// Remove credentials for `registry`. Returns whether an entry existed.
    pub fn remove(&self, registry: &str) -> Result<bool> {
        let mut file = self.load()?;
        if file.registries.remove(&normalize_registry(registry)).is_none() {
            return Ok(false);
        }
        self.save(&file)?;
        Ok(true)
    }

    /// Registries with stored credentials, sorted.
    pub fn registries(&self) -> Result<Vec<String>> {
        Ok(self.load()?.registries.into_keys().collect())
    }

    fn load(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| OlmError::filesystem(&self.path, e))?;
        serde_json::from_str(&data).map_err(|e| {
            OlmError::ConfigError(format!(
                "Failed to parse credential store {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, file: &CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OlmError::filesystem(parent, e))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let data = serde_json::to_string_pretty(file)?;
        std::fs::write(&tmp_path, data).map_err(|e| OlmError::filesystem(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| OlmError::filesystem(&self.path, e))?;
        Ok(())
    }
}

/// Docker Hub aliases share one entry.
fn normalize_registry(registry: &str) -> String {
    let r = registry.trim().to_lowercase();
    match r.as_str() {
        "docker.io" | "registry-1.docker.io" => "index.docker.io".to_string(),
        _ => r,
    }
}
