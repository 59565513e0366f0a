//! Credential stores.
//!
//! The identity provider caches tokens as plain key/value pairs, the same
//! layout a browser SDK writes into local and session storage. Keys written
//! by the provider all start with [`PROVIDER_PREFIX`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{AuthError, AuthResult};

/// Namespace prefix of every key the identity provider writes.
pub const PROVIDER_PREFIX: &str = "CognitoIdentityServiceProvider.";

/// Key/value storage for cached credentials.
///
/// Implementations must be safe to share between tasks.
pub trait CredentialStore: Send + Sync {
    /// Lists all keys currently stored.
    fn keys(&self) -> Vec<String>;

    /// Gets a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Sets a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> AuthResult<()>;

    /// Removes a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> AuthResult<()>;

    /// Removes every key starting with `prefix`.
    ///
    /// Returns the number of keys removed.
    fn remove_prefixed(&self, prefix: &str) -> AuthResult<usize> {
        let doomed: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        for key in &doomed {
            self.remove(key)?;
        }
        Ok(doomed.len())
    }
}

/// Key layout used for cached tokens.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    client_prefix: String,
}

impl TokenKeys {
    /// Creates the key layout for an app client.
    #[must_use]
    pub fn new(client_id: &str) -> Self {
        Self {
            client_prefix: format!("{PROVIDER_PREFIX}{client_id}."),
        }
    }

    /// Prefix shared by every key of this client.
    #[must_use]
    pub fn client_prefix(&self) -> &str {
        &self.client_prefix
    }

    /// Key pointing at the last signed-in username.
    #[must_use]
    pub fn last_auth_user(&self) -> String {
        format!("{}LastAuthUser", self.client_prefix)
    }

    /// Key for one token of a user.
    #[must_use]
    pub fn token(&self, username: &str, kind: &str) -> String {
        format!("{}{username}.{kind}", self.client_prefix)
    }
}

/// Well-known token kinds.
pub mod kinds {
    /// Access token.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// ID token.
    pub const ID_TOKEN: &str = "idToken";
    /// Refresh token.
    pub const REFRESH_TOKEN: &str = "refreshToken";
}

/// In-memory credential store.
///
/// Stands in for browser session storage: contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Checks if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Credential store persisted as a JSON object on disk.
///
/// Stands in for browser local storage. The whole file is rewritten on every
/// change; the store only ever holds a handful of tokens.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens a store, loading existing entries if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| AuthError::Storage(format!("failed to read {}: {e}", path.display())))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::Storage(format!("failed to create {}: {e}", parent.display())))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)
            .map_err(|e| AuthError::Storage(format!("failed to write {}: {e}", self.path.display())))
    }
}

impl CredentialStore for FileStore {
    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
