//! Application configuration management.
//!
//! Holds the API base URL, request timeout, token storage backend and the
//! last username used to log in. Stored at `~/.config/crmdash/config.json`;
//! a few settings can be overridden from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "crmdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "CRMDASH_API_URL";
pub const ENV_STORAGE: &str = "CRMDASH_STORAGE";
pub const ENV_TIMEOUT: &str = "CRMDASH_TIMEOUT_SECS";

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keychain,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keychain" | "keyring" => Ok(StorageBackend::Keychain),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown storage backend '{}' (expected file, keychain or memory)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(storage) = lookup(ENV_STORAGE) {
            self.storage = storage
                .parse::<StorageBackend>()
                .with_context(|| format!("Invalid {}", ENV_STORAGE))?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: {}", ENV_TIMEOUT, timeout))?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Build the token store for the configured backend
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.storage {
            StorageBackend::File => Arc::new(FileTokenStore::in_dir(&self.data_dir()?)),
            StorageBackend::Keychain => Arc::new(KeyringTokenStore::new()),
            StorageBackend::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), "http://localhost:8000/api");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_parse_storage_backend() {
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("Keychain".parse::<StorageBackend>().unwrap(), StorageBackend::Keychain);
        assert_eq!("keyring".parse::<StorageBackend>().unwrap(), StorageBackend::Keychain);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("cookie".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://crm.example.com/api"),
            (ENV_STORAGE, "memory"),
            (ENV_TIMEOUT, "5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("valid overrides");

        assert_eq!(config.api_url(), "https://crm.example.com/api");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_empty_and_invalid_overrides() {
        let mut config = Config {
            api_url: Some("http://saved/api".to_string()),
            ..Config::default()
        };
        config
            .apply_overrides(|key| (key == ENV_API_URL).then(|| "  ".to_string()))
            .expect("empty value is ignored");
        assert_eq!(config.api_url(), "http://saved/api");

        assert!(config
            .apply_overrides(|key| (key == ENV_TIMEOUT).then(|| "soon".to_string()))
            .is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crmdash").join(CONFIG_FILE);

        assert!(Config::load_from(&path).expect("missing file").last_username.is_none());

        let config = Config {
            last_username: Some("alice".to_string()),
            storage: StorageBackend::Keychain,
            ..Config::default()
        };
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
        assert_eq!(loaded.storage, StorageBackend::Keychain);
    }

    #[test]
    fn test_missing_storage_field_defaults_to_file() {
        let config: Config = serde_json::from_str(r#"{"last_username":"bob"}"#).expect("parse");
        assert_eq!(config.storage, StorageBackend::File);
    }
}
