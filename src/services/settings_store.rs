//! Key/value storage for saved calculator settings.
//!
//! The calculator only ever stores strings under string keys; what sits
//! behind that (a directory of JSON files, memory) is up to the store.

use crate::error::{AppError, Result};
use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Opaque get/set-by-key string store.
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing what was there.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// File store
// =============================================================================

/// One file per key inside a settings directory.
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                AppError::Storage(format!(
                    "failed to create settings directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a key.
    fn path_for(&self, key: &str) -> PathBuf {
        // Sanitize key for filesystem
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(format!("{}.json", safe_key))
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!("Failed to read settings {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Atomic replace via sibling temp file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved settings {} to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory store
// =============================================================================

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemorySettingsStore {
    data: DashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySettingsStore::new();
        assert!(store.is_empty());

        store.save("k", "v1").unwrap();
        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").unwrap(), Some("v2".to_string()));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested")).unwrap();

        assert_eq!(store.load("calculator_settings").unwrap(), None);
        store.save("calculator_settings", "{\"a\":1}").unwrap();
        assert_eq!(
            store.load("calculator_settings").unwrap(),
            Some("{\"a\":1}".to_string())
        );

        store.remove("calculator_settings").unwrap();
        assert_eq!(store.load("calculator_settings").unwrap(), None);
        store.remove("calculator_settings").unwrap();
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path()).unwrap();

        store.save("a/b:c", "x").unwrap();
        assert!(dir.path().join("a_b_c.json").exists());
        assert_eq!(store.load("a/b:c").unwrap(), Some("x".to_string()));
    }
}
