//! Storage trait definitions.

use crate::StorageResult;

/// Trait for a single key/value persistence scope.
pub trait ScopedStorage: Send + Sync {
    /// Store a value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns true if the key existed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
