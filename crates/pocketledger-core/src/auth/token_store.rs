use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed storage key for the access token
pub const TOKEN_KEY: &str = "accessToken";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "pocketledger";

/// Where the access token survives between runs.
pub trait TokenStore: Send + Sync {
    fn get_token(&self) -> Result<Option<String>>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// Which [`TokenStore`] the application uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl TokenBackend {
    pub fn open(&self, cache_dir: &Path) -> Arc<dyn TokenStore> {
        match self {
            TokenBackend::File => Arc::new(FileTokenStore::new(cache_dir.to_path_buf())),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new(SERVICE_NAME)),
            TokenBackend::Memory => Arc::new(MemoryTokenStore::default()),
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Token kept for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ============================================================================
// Session file
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub saved_at: DateTime<Utc>,
}

/// Token persisted as `session.json` in the cache directory
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load the session file, including when it was written
    pub fn load(&self) -> Result<Option<SessionFile>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let session: SessionFile =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(session))
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|s| s.access_token))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let session = SessionFile {
            access_token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&session)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token stored in the OS keychain
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear_token(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.get_token().expect("memory"), None);
        store.set_token("abc").expect("memory");
        assert_eq!(store.get_token().expect("memory"), Some("abc".to_string()));
        store.clear_token().expect("memory");
        store.clear_token().expect("memory");
        assert_eq!(store.get_token().expect("memory"), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileTokenStore::new(dir.path().join("nested"));
        assert_eq!(store.get_token().expect("no file yet"), None);

        store.set_token("abc").expect("write session");
        assert_eq!(store.get_token().expect("read session"), Some("abc".to_string()));

        let raw = std::fs::read_to_string(dir.path().join("nested").join(SESSION_FILE))
            .expect("session file exists");
        assert!(raw.contains("\"accessToken\": \"abc\""));

        store.clear_token().expect("remove session");
        store.clear_token().expect("already removed");
        assert_eq!(store.get_token().expect("no file"), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(SESSION_FILE), "not json").expect("write");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        assert!(store.get_token().is_err());
    }

    #[test]
    fn test_backend_names() {
        let backend: TokenBackend = serde_json::from_str("\"keyring\"").expect("valid backend");
        assert_eq!(backend, TokenBackend::Keyring);
        assert_eq!(TokenBackend::default(), TokenBackend::File);
    }
}
