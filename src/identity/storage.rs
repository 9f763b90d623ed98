//! Durable client-side storage for the session.
//!
//! The session is persisted as a handful of named string values so that it
//! survives process restarts, the same way a browser keeps it across reloads.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;

pub const KEY_AUTHORIZATION: &str = "Authorization";
pub const KEY_ROLE: &str = "Role";
pub const KEY_NAME: &str = "Name";
pub const KEY_AUTH_TIMESTAMP: &str = "authTimestamp";
pub const KEY_IS_AUTHENTICATED: &str = "isAuthenticated";

/// Every key owned by the session; logout clears all of them.
pub const SESSION_KEYS: [&str; 5] = [KEY_AUTHORIZATION, KEY_ROLE, KEY_NAME, KEY_AUTH_TIMESTAMP, KEY_IS_AUTHENTICATED];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage io error at {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("session storage encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Every stored value, read in one pass. Values that belong together
    /// (one session) must be taken from the same snapshot.
    fn snapshot(&self) -> BTreeMap<String, String>;

    /// Write several values as one replace. Keys absent from `values` are left untouched.
    fn set_many(&self, values: &[(&str, String)]) -> Result<(), StorageError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Raw write of a single value, for seeding malformed state in tests.
    pub fn put(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool { self.values.read().is_empty() }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> { self.values.read().get(key).cloned() }

    fn snapshot(&self) -> BTreeMap<String, String> { self.values.read().clone() }

    fn set_many(&self, values: &[(&str, String)]) -> Result<(), StorageError> {
        let mut m = self.values.write();
        for (k, v) in values { m.insert((*k).to_string(), v.clone()); }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut m = self.values.write();
        for k in keys { m.remove(*k); }
        Ok(())
    }
}

/// JSON-object file. The file is re-read on every `get` so that several
/// processes sharing one profile observe each other's login/logout.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), lock: RwLock::new(()) } }

    pub fn path(&self) -> &Path { &self.path }

    // Missing or unparsable file reads as empty.
    fn load(&self) -> BTreeMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(target: "labkeeper::session", "ignoring unreadable session file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io { path: self.path.clone(), source };
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(io_err)?;
        let text = serde_json::to_string_pretty(values)?;
        // Unique temp name per write.
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _g = self.lock.read();
        self.load().get(key).cloned()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        let _g = self.lock.read();
        self.load()
    }

    fn set_many(&self, values: &[(&str, String)]) -> Result<(), StorageError> {
        let _g = self.lock.write();
        let mut m = self.load();
        for (k, v) in values { m.insert((*k).to_string(), v.clone()); }
        self.save(&m)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _g = self.lock.write();
        if !self.path.exists() { return Ok(()); }
        let mut m = self.load();
        for k in keys { m.remove(*k); }
        self.save(&m)
    }
}
