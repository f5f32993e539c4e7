//! In-process storage backend for the ephemeral scope.

use crate::{ScopedStorage, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-lifetime key/value storage. Everything here is gone when the
/// client exits, which is exactly the ephemeral scope's contract.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopedStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().unwrap();
        Ok(data.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));

        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v2".to_string()));

        assert!(storage.delete("k").unwrap());
        assert!(!storage.delete("k").unwrap());
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
