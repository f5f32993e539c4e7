//! Credential storage for the Petmily client.
//!
//! This crate provides the two persistence scopes a login can choose from:
//! - **Durable**: a JSON credential file surviving restarts
//! - **Ephemeral**: in-process memory cleared when the client exits
//!
//! and the `CredentialStore` that keeps them mutually exclusive for the
//! session keys, falls back durable-first on read, and clears fail-safe.

mod file;
mod keys;
mod memory;
mod store;
mod traits;

pub use file::FileStorage;
pub use keys::CredentialKeys;
pub use memory::MemoryStorage;
pub use store::{CredentialStore, StorageScope, StoredCredential, UserIdentity};
pub use traits::ScopedStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
