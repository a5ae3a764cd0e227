//! Durable storage for the session token.
//!
//! Every backend holds exactly one token under a fixed key.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use tracing::debug;

use super::error::StorageError;
use super::session::StoredToken;

/// Fixed key the token lives under
pub const TOKEN_KEY: &str = "token";

/// Keychain service name
const KEYRING_SERVICE: &str = "crmdash";

pub trait TokenStore: Send + Sync {
    /// Read the persisted token, `None` if nothing is stored
    fn load(&self) -> Result<Option<StoredToken>, StorageError>;

    fn save(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the persisted token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StorageError>;

    /// Where the token lives, for display
    fn location(&self) -> String;
}

/// Token persisted as JSON in a file
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `token.json` inside the given directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{}.json", TOKEN_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let stored: StoredToken = serde_json::from_str(&contents)?;
        Ok(Some(stored))
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&StoredToken::new(token))?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Token written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Token persisted in the OS keychain
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, TOKEN_KEY)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(StoredToken::undated(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        format!("keychain ({}/{})", self.service, TOKEN_KEY)
    }
}

/// Token held only for the life of the process
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a token, as if persisted by an earlier run
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(StoredToken::new(token))),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredToken>> {
        // The slot holds plain data, so a poisoned lock is still consistent
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        Ok(self.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.lock() = Some(StoredToken::new(token));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock() = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::in_dir(&dir.path().join("nested"));

        assert_eq!(store.load().expect("load empty"), None);

        store.save("tok1").expect("save");
        let stored = store.load().expect("load").expect("token present");
        assert_eq!(stored.token, "tok1");
        assert!(stored.saved_at.is_some());

        store.save("tok2").expect("overwrite");
        assert_eq!(store.load().expect("load").map(|s| s.token).as_deref(), Some("tok2"));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load cleared"), None);
        store.clear().expect("clearing twice is fine");
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").expect("write");
        assert!(matches!(store.load(), Err(StorageError::Parse(_))));
    }

    #[test]
    fn test_file_store_location() {
        let store = FileTokenStore::in_dir(Path::new("/tmp/crmdash"));
        assert!(store.location().ends_with("token.json"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().expect("load"), None);

        store.save("tok1").expect("save");
        assert_eq!(store.load().expect("load").map(|s| s.token).as_deref(), Some("tok1"));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);

        let seeded = MemoryTokenStore::with_token("old");
        assert_eq!(seeded.load().expect("load").map(|s| s.token).as_deref(), Some("old"));
    }
}
