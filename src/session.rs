//! Client-side token storage.
//!
//! Mirrors the two browser stores the auth provider caches sessions in:
//! a persistent "local" store (a JSON file for the terminal panel) and a
//! per-run "session" store (memory). Keys written by the provider carry the
//! [`SESSION_KEY_PREFIX`] so sign-out can wipe them without knowing exact
//! key names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Prefix of every key the auth provider writes.
pub const SESSION_KEY_PREFIX: &str = "sb-";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key/value store in the shape of browser `Storage`.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Remove every key starting with `prefix`. Returns how many were removed.
///
/// # Errors
///
/// Propagates the first store failure; keys removed before it stay removed.
pub fn clear_prefixed(store: &dyn TokenStore, prefix: &str) -> Result<usize, StoreError> {
    let mut removed = 0;
    for key in store.keys()? {
        if key.starts_with(prefix) {
            store.remove(&key)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// The local and session stores, shared by the backend and the panel.
#[derive(Clone)]
pub struct TokenStores {
    pub local: Arc<dyn TokenStore>,
    pub session: Arc<dyn TokenStore>,
}

impl TokenStores {
    /// Two in-memory stores; nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { local: Arc::new(MemoryTokenStore::default()), session: Arc::new(MemoryTokenStore::default()) }
    }

    /// File-backed local store with an in-memory session store.
    #[must_use]
    pub fn with_local_file(path: impl Into<PathBuf>) -> Self {
        Self { local: Arc::new(FileTokenStore::new(path)), session: Arc::new(MemoryTokenStore::default()) }
    }

    /// Wipe provider keys from both stores.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the session store is still cleared when
    /// the local store fails.
    pub fn clear_provider_keys(&self) -> Result<usize, StoreError> {
        let local = clear_prefixed(self.local.as_ref(), SESSION_KEY_PREFIX);
        let session = clear_prefixed(self.session.as_ref(), SESSION_KEY_PREFIX);
        Ok(local? + session?)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// A JSON object on disk. The file is created on first write; a missing
/// file reads as empty.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read()?;
        f(&mut entries);
        self.write(&entries)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.into_keys().collect())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
