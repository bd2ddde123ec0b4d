use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Heuristic floor for key length. Real validation only happens on first use
/// against the API; this just catches obvious paste accidents.
const MIN_KEY_LEN: usize = 20;

/// Strip all whitespace from a raw user-entered key and apply the length
/// floor. Returns the normalized key ready to persist.
pub fn normalize_key(raw: &str) -> Result<String, ClientError> {
    let key: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if key.is_empty() {
        return Err(ClientError::EmptyKey);
    }
    if key.len() < MIN_KEY_LEN {
        return Err(ClientError::KeyTooShort);
    }
    Ok(key)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoredConfig {
    #[serde(default)]
    api_key: Option<String>,
}

/// Single-slot persisted credential store backed by a YAML file. Read once at
/// startup, overwritten on every successful `set-key`. The key never leaves
/// this file except as the query parameter of the inference call.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location under the platform config dir.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine the config directory"))?;
        Ok(base.join("handscribe").join("config.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored key, or None if nothing was ever saved.
    pub fn load(&self) -> anyhow::Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: StoredConfig = serde_yaml::from_str(&content)?;
        Ok(config.api_key.filter(|k| !k.is_empty()))
    }

    /// Persist a normalized key, replacing any prior value.
    pub fn save(&self, key: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let config = StoredConfig {
            api_key: Some(key.to_string()),
        };
        std::fs::write(&self.path, serde_yaml::to_string(&config)?)?;
        debug!("Credential written to {}", self.path.display());
        Ok(())
    }
}
