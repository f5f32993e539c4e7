//! High-level API for the two-scope credential store.

use crate::{CredentialKeys, FileStorage, MemoryStorage, ScopedStorage, StorageResult};
use petmily_core::Paths;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Persistence scope chosen at login time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageScope {
    /// Survives client restarts (credential file).
    Durable,
    /// Cleared when the client process ends.
    Ephemeral,
}

/// Identity as last confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Account ID from the backend
    pub account_id: i64,
    /// Login username
    pub username: String,
    /// Account role (e.g. "USER", "ADMIN")
    pub role: String,
}

/// A complete credential read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredential {
    /// Opaque bearer token
    pub token: String,
    /// Identity stored alongside the token
    pub user: UserIdentity,
}

/// Credential store over the durable and ephemeral scopes.
///
/// Exactly one scope holds the session keys at a time: every write clears
/// the other scope first. Reads check durable before ephemeral. A record
/// that is present but incomplete or unparsable is treated as corrupted:
/// both scopes are purged and the read reports nothing, so the client
/// never proceeds on half-valid state.
pub struct CredentialStore {
    durable: Box<dyn ScopedStorage>,
    ephemeral: Box<dyn ScopedStorage>,
}

impl CredentialStore {
    /// Create a credential store over explicit scope backends.
    pub fn new(durable: Box<dyn ScopedStorage>, ephemeral: Box<dyn ScopedStorage>) -> Self {
        Self { durable, ephemeral }
    }

    /// Create the default store: credential file for the durable scope,
    /// process memory for the ephemeral scope.
    pub fn open(paths: &Paths) -> Self {
        Self::new(
            Box::new(FileStorage::new(paths.credentials_file())),
            Box::new(MemoryStorage::new()),
        )
    }

    fn scope(&self, scope: StorageScope) -> &dyn ScopedStorage {
        match scope {
            StorageScope::Durable => self.durable.as_ref(),
            StorageScope::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    fn other(&self, scope: StorageScope) -> &dyn ScopedStorage {
        match scope {
            StorageScope::Durable => self.ephemeral.as_ref(),
            StorageScope::Ephemeral => self.durable.as_ref(),
        }
    }

    fn purge(storage: &dyn ScopedStorage) -> StorageResult<()> {
        for key in CredentialKeys::ALL {
            storage.delete(key)?;
        }
        Ok(())
    }

    /// Write a full credential record to the chosen scope.
    ///
    /// The unused scope is cleared first so the same logical session never
    /// exists in both. The token is written under the canonical key and,
    /// in one place only, under both compatibility aliases. Durable writes
    /// additionally record the remember flag and the username for login
    /// form prefill.
    pub fn write(&self, scope: StorageScope, token: &str, user: &UserIdentity) -> StorageResult<()> {
        Self::purge(self.other(scope))?;

        let storage = self.scope(scope);
        self.write_token_keys(storage, token)?;

        let serialized = serde_json::to_string(user)
            .map_err(|e| crate::StorageError::Encoding(e.to_string()))?;
        storage.set(CredentialKeys::USER, &serialized)?;

        if scope == StorageScope::Durable {
            storage.set(CredentialKeys::REMEMBER_ME, "true")?;
            storage.set(CredentialKeys::SAVED_USERNAME, &user.username)?;
        }

        debug!(scope = ?scope, username = %user.username, "Credential written");
        Ok(())
    }

    /// Stage only the bearer token into the chosen scope.
    ///
    /// Used by the redirect-based exchange, which must authorize an
    /// identity fetch before it has the user to complete the record. A
    /// staged token that never gets its identity is a half record: `read`
    /// purges it on the next restore.
    pub fn stage_token(&self, scope: StorageScope, token: &str) -> StorageResult<()> {
        Self::purge(self.other(scope))?;
        self.write_token_keys(self.scope(scope), token)
    }

    /// The single compatibility step writing the token aliases.
    fn write_token_keys(&self, storage: &dyn ScopedStorage, token: &str) -> StorageResult<()> {
        storage.set(CredentialKeys::TOKEN, token)?;
        storage.set(CredentialKeys::USER_TOKEN, token)?;
        storage.set(CredentialKeys::ACCESS_TOKEN, token)?;
        Ok(())
    }

    /// Read the persisted credential, durable scope first.
    ///
    /// Returns `None` when nothing usable is stored. A scope holding a
    /// token without a parsable user (or the reverse) is corrupted state:
    /// every known key is purged from both scopes before returning `None`.
    pub fn read(&self) -> StorageResult<Option<StoredCredential>> {
        for scope in [StorageScope::Durable, StorageScope::Ephemeral] {
            let storage = self.scope(scope);
            let token = storage.get(CredentialKeys::TOKEN)?;
            let user_raw = storage.get(CredentialKeys::USER)?;

            match (token, user_raw) {
                (Some(token), Some(raw)) => match serde_json::from_str::<UserIdentity>(&raw) {
                    Ok(user) => return Ok(Some(StoredCredential { token, user })),
                    Err(e) => {
                        warn!(scope = ?scope, error = %e, "Stored user identity unparsable, purging credential");
                        self.clear()?;
                        return Ok(None);
                    }
                },
                (None, None) => continue,
                _ => {
                    warn!(scope = ?scope, "Half-written credential found, purging");
                    self.clear()?;
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    /// Get the current bearer token, durable scope first.
    ///
    /// Unlike `read`, this never purges; it is the per-request lookup used
    /// when attaching the Authorization header.
    pub fn token(&self) -> StorageResult<Option<String>> {
        if let Some(token) = self.durable.get(CredentialKeys::TOKEN)? {
            return Ok(Some(token));
        }
        self.ephemeral.get(CredentialKeys::TOKEN)
    }

    /// Remove every known key from both scopes. Idempotent.
    pub fn clear(&self) -> StorageResult<()> {
        Self::purge(self.durable.as_ref())?;
        Self::purge(self.ephemeral.as_ref())?;
        Ok(())
    }

    /// Username saved by the last durable login, for form prefill.
    pub fn saved_username(&self) -> StorageResult<Option<String>> {
        self.durable.get(CredentialKeys::SAVED_USERNAME)
    }

    /// Whether the last login asked to be remembered.
    pub fn remember_preferred(&self) -> StorageResult<bool> {
        Ok(self
            .durable
            .get(CredentialKeys::REMEMBER_ME)?
            .map(|v| v == "true")
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn test_store() -> CredentialStore {
        CredentialStore::new(Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    }

    fn test_user() -> UserIdentity {
        UserIdentity {
            account_id: 17,
            username: "dandelion".to_string(),
            role: "USER".to_string(),
        }
    }

    fn assert_scope_empty(store: &CredentialStore, scope: StorageScope) {
        for key in ["token", "userToken", "accessToken", "user", "rememberMe", "savedUsername"] {
            assert_eq!(
                store.scope(scope).get(key).unwrap(),
                None,
                "key {key} should be absent"
            );
        }
    }

    #[test]
    fn test_clear_idempotent() {
        let store = test_store();
        store.write(StorageScope::Durable, "t1", &test_user()).unwrap();

        store.clear().unwrap();
        assert_scope_empty(&store, StorageScope::Durable);
        assert_scope_empty(&store, StorageScope::Ephemeral);

        // Clearing again (and again) stays a no-op
        store.clear().unwrap();
        store.clear().unwrap();
        assert_scope_empty(&store, StorageScope::Durable);
        assert_scope_empty(&store, StorageScope::Ephemeral);
    }

    #[test]
    fn test_clear_on_empty_store_is_safe() {
        let store = test_store();
        store.clear().unwrap();
        assert_scope_empty(&store, StorageScope::Durable);
    }

    #[test]
    fn test_exclusive_scope_write() {
        let store = test_store();

        store.write(StorageScope::Durable, "t1", &test_user()).unwrap();
        assert_eq!(store.scope(StorageScope::Ephemeral).get("token").unwrap(), None);

        let cred = store.read().unwrap().unwrap();
        assert_eq!(cred.token, "t1");
        assert_eq!(cred.user, test_user());
    }

    #[test]
    fn test_write_switches_scopes() {
        let store = test_store();

        store.write(StorageScope::Durable, "t1", &test_user()).unwrap();
        store.write(StorageScope::Ephemeral, "t2", &test_user()).unwrap();

        // The durable copy of the session (and its prefill keys) is gone
        assert_scope_empty(&store, StorageScope::Durable);
        assert_eq!(store.read().unwrap().unwrap().token, "t2");
    }

    #[test]
    fn test_write_sets_alias_keys() {
        let store = test_store();
        store.write(StorageScope::Durable, "t1", &test_user()).unwrap();

        let durable = store.scope(StorageScope::Durable);
        assert_eq!(durable.get("token").unwrap(), Some("t1".to_string()));
        assert_eq!(durable.get("userToken").unwrap(), Some("t1".to_string()));
        assert_eq!(durable.get("accessToken").unwrap(), Some("t1".to_string()));
    }

    #[test]
    fn test_durable_write_records_prefill_keys() {
        let store = test_store();
        store.write(StorageScope::Durable, "t1", &test_user()).unwrap();

        assert_eq!(store.saved_username().unwrap(), Some("dandelion".to_string()));
        assert!(store.remember_preferred().unwrap());
    }

    #[test]
    fn test_ephemeral_write_records_no_prefill_keys() {
        let store = test_store();
        store.write(StorageScope::Ephemeral, "t1", &test_user()).unwrap();

        assert_eq!(store.saved_username().unwrap(), None);
        assert!(!store.remember_preferred().unwrap());
        assert_eq!(
            store.scope(StorageScope::Ephemeral).get("rememberMe").unwrap(),
            None
        );
    }

    #[test]
    fn test_read_prefers_durable() {
        let store = test_store();
        // Ephemeral holds a session, then a durable login replaces it
        store.write(StorageScope::Ephemeral, "t-old", &test_user()).unwrap();
        store.write(StorageScope::Durable, "t-new", &test_user()).unwrap();

        assert_eq!(store.read().unwrap().unwrap().token, "t-new");
        assert_eq!(store.token().unwrap(), Some("t-new".to_string()));
    }

    #[test]
    fn test_read_falls_back_to_ephemeral() {
        let store = test_store();
        store.write(StorageScope::Ephemeral, "t1", &test_user()).unwrap();

        assert_eq!(store.read().unwrap().unwrap().token, "t1");
    }

    #[test]
    fn test_corrupted_user_purges_both_scopes() {
        let store = test_store();
        let durable = store.scope(StorageScope::Durable);
        durable.set("token", "t1").unwrap();
        durable.set("user", "{not valid json").unwrap();
        store
            .scope(StorageScope::Ephemeral)
            .set("savedUsername", "stale")
            .unwrap();

        assert!(store.read().unwrap().is_none());
        assert_scope_empty(&store, StorageScope::Durable);
        assert_scope_empty(&store, StorageScope::Ephemeral);
    }

    #[test]
    fn test_half_record_purges() {
        let store = test_store();
        // Token without user, as left behind by an interrupted exchange
        store.stage_token(StorageScope::Durable, "t1").unwrap();

        assert!(store.read().unwrap().is_none());
        assert_scope_empty(&store, StorageScope::Durable);
    }

    #[test]
    fn test_stage_token_visible_to_token_lookup() {
        let store = test_store();
        store.stage_token(StorageScope::Durable, "t1").unwrap();

        // The per-request lookup sees the staged token without purging it
        assert_eq!(store.token().unwrap(), Some("t1".to_string()));
        assert_eq!(store.token().unwrap(), Some("t1".to_string()));
    }

    #[test]
    fn test_token_without_credential_is_none() {
        let store = test_store();
        assert_eq!(store.token().unwrap(), None);
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_restore_round_trip_across_restart() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let paths = petmily_core::Paths::with_base_dir(dir.path().to_path_buf());

        {
            let store = CredentialStore::open(&paths);
            store.write(StorageScope::Durable, "t1", &test_user()).unwrap();
        }

        // Fresh store over the same paths, as after a client restart
        let store = CredentialStore::open(&paths);
        let cred = store.read().unwrap().unwrap();
        assert_eq!(cred.token, "t1");
        assert_eq!(cred.user.username, "dandelion");
    }

    #[test]
    fn test_ephemeral_does_not_survive_restart() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let paths = petmily_core::Paths::with_base_dir(dir.path().to_path_buf());

        {
            let store = CredentialStore::open(&paths);
            store.write(StorageScope::Ephemeral, "t1", &test_user()).unwrap();
        }

        let store = CredentialStore::open(&paths);
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_user_identity_serialized_camel_case() {
        let serialized = serde_json::to_string(&test_user()).unwrap();
        assert!(serialized.contains("\"accountId\":17"));
        assert!(serialized.contains("\"username\":\"dandelion\""));
    }
}
