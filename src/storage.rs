use parking_lot::{Mutex, RwLock};
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::StorageError;

/// Well-known keys of the persistent store.
pub mod keys {
    /// Raw bearer token of the current session.
    pub const TOKEN: &str = "token";
    /// JSON-serialized `SessionUser`.
    pub const USER: &str = "user";
    /// Email entered on the forgot-password step.
    pub const FORGOT_PASSWORD_EMAIL: &str = "forgotPasswordEmail";
    /// Code accepted on the enter-code step.
    pub const VERIFICATION_CODE: &str = "verificationCode";
}

// 1. LocalStorage Contract
/// LocalStorage
///
/// Abstract contract for the client's persistent string key/value store. The session
/// store and the password-reset forms only talk to this trait, so the file-backed
/// store used by the binary can be swapped for the in-memory store in tests.
pub trait LocalStorage: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes (or overwrites) a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// 2. The Real Implementation (JSON file)
/// FileStorage
///
/// Persists the store as a flat JSON object on disk. Every operation re-reads the
/// file, so two shells sharing one file observe each other's writes the way two
/// browser tabs share local storage. The mutex only serializes access within this
/// process; concurrent processes can still race, last write wins.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// 3. The In-Memory Implementation (tests, ephemeral shells)
/// MemoryStorage
///
/// Process-local store with no persistence. Used by the test suite and by shells
/// started with an empty `STORAGE_PATH`.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, mirroring values left behind by an earlier run.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// StorageState
///
/// The shared handle to the persistent store used across the portal context.
pub type StorageState = Arc<dyn LocalStorage>;
