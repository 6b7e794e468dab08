//! Durable key-value storage for session state
//!
//! [`FileStore`] keeps one JSON document per key under a state directory.
//! Writes take an exclusive lock on a sidecar lock file and go through a temp
//! file + rename so a crash never leaves a half-written value behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use mdviewer_core::prelude::*;

/// Key the tab manager persists its collection under
pub const TABS_KEY: &str = "tabs";

/// Minimal string-valued key-value store
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn lock_file(&self) -> Result<std::fs::File> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(".lock"))
            .map_err(|e| Error::storage(format!("Failed to open lock file: {}", e)))?;

        // Released when the handle is dropped
        file.lock_exclusive()
            .map_err(|e| Error::storage(format!("Failed to lock state dir: {}", e)))?;
        Ok(file)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _lock = self.lock_file()?;

        let temp_path = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&temp_path, value)
            .map_err(|e| Error::storage(format!("Failed to write temp file: {}", e)))?;
        std::fs::rename(&temp_path, &path)
            .map_err(|e| Error::storage(format!("Failed to rename temp file: {}", e)))?;

        trace!("Stored '{}' ({} bytes) in {:?}", key, value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _lock = self.lock_file()?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Volatile store used for `--ephemeral` sessions and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_round_trip() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path().join("state"));

        assert_eq!(store.get(TABS_KEY).unwrap(), None);
        store.set(TABS_KEY, r#"{"tabs":[]}"#).unwrap();
        assert_eq!(
            store.get(TABS_KEY).unwrap().as_deref(),
            Some(r#"{"tabs":[]}"#)
        );
        assert!(temp.path().join("state").join("tabs.json").exists());
    }

    #[test]
    fn test_file_store_overwrite_leaves_no_temp_file() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();

        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        assert!(!temp.path().join(".k.json.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_is_idempotent() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();

        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        let err = store.set("../escape", "v").unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_shared_store_sees_writes() {
        let store = Arc::new(MemoryStore::new());
        let handle: Box<dyn KeyValueStore> = Box::new(store.clone());

        handle.set(TABS_KEY, "x").unwrap();

        assert_eq!(store.get(TABS_KEY).unwrap().as_deref(), Some("x"));
    }
}
