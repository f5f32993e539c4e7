//! File-backed storage backend for the durable scope.

use crate::{ScopedStorage, StorageResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Durable key/value storage persisted as a JSON object in a single file.
///
/// The file is read on every access and rewritten on every mutation; the
/// credential key set is small enough that this stays cheap. A missing
/// file reads as empty. An unreadable file also reads as empty, so a
/// damaged credential file degrades to "not logged in" instead of wedging
/// the client.
pub struct FileStorage {
    path: PathBuf,
    /// Serializes load-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a file storage backed by the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Credential file unreadable, treating as empty");
                HashMap::new()
            }
        }
    }

    fn persist(&self, map: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| crate::StorageError::Encoding(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ScopedStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.load();
        map.insert(key.to_string(), value.to_string());
        self.persist(&map)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.load();
        let existed = map.remove(key).is_some();
        if existed {
            self.persist(&map)?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("credentials.json"));

        assert_eq!(storage.get("token").unwrap(), None);
        assert!(!storage.has("token").unwrap());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        {
            let storage = FileStorage::new(path.clone());
            storage.set("token", "t1").unwrap();
        }

        // Fresh instance over the same file, as after a client restart
        let storage = FileStorage::new(path);
        assert_eq!(storage.get("token").unwrap(), Some("t1".to_string()));
    }

    #[test]
    fn test_delete_returns_existence() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("credentials.json"));

        storage.set("token", "t1").unwrap();
        assert!(storage.delete("token").unwrap());
        assert!(!storage.delete("token").unwrap());
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let storage = FileStorage::new(path.clone());

        storage.set("token", "t1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unreadable_file_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not valid json").unwrap();

        let storage = FileStorage::new(path);
        assert_eq!(storage.get("token").unwrap(), None);
    }
}
