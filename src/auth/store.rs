//! Durable credential storage
//!
//! The store is an injected capability: the session and the request gateway
//! both hold the same [`CredentialStore`] and never touch ambient globals.
//! Writes go straight to the backend, so a `get` after `set` or `clear`
//! always observes the write.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::HeaderValue;
use tracing::warn;

use crate::auth::types::UserProfile;
use crate::config::ClientOptions;
use crate::error::{Error, Result};

/// String key-value storage that outlives the client process
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and sessions that should not persist
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Bearer token and cached profile, stored under two keys and cleared together
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    token_key: String,
    profile_key: String,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, options: &ClientOptions) -> Self {
        Self {
            backend,
            token_key: options.token_key.clone(),
            profile_key: options.profile_key.clone(),
        }
    }

    /// Memory-backed store with default keys
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), &ClientOptions::default())
    }

    /// Current bearer token. Unreadable storage counts as no token.
    pub fn get(&self) -> Option<String> {
        match self.backend.get(&self.token_key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to read token from credential store");
                None
            }
        }
    }

    /// Store a bearer token. It must be usable as an `Authorization` value.
    pub fn set(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::invalid_input("refusing to store an empty token"));
        }
        if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
            return Err(Error::invalid_input("token is not a valid header value"));
        }
        self.backend.set(&self.token_key, token)
    }

    /// Remove token and profile.
    pub fn clear(&self) -> Result<()> {
        let token = self.backend.delete(&self.token_key);
        let profile = self.backend.delete(&self.profile_key);
        token.and(profile)
    }

    /// Cached profile. A corrupt entry is treated as absent.
    pub fn profile(&self) -> Option<UserProfile> {
        let raw = match self.backend.get(&self.profile_key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "failed to read profile from credential store");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(error = %err, "discarding unreadable cached profile");
                None
            }
        }
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.backend.set(&self.profile_key, &raw)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("token_key", &self.token_key)
            .field("profile_key", &self.profile_key)
            .field("has_token", &self.get().is_some())
            .finish()
    }
}
