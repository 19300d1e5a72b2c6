//! Credential storage for page-load auto-connect.
//!
//! The platform stores the signed-in user's id and session token in the
//! page's key-value storage under fixed keys. [`KeyValueStorage`] is the
//! seam over that storage (the embedding layer adapts the browser's local
//! and session storage to it); [`MemoryStorage`] is the in-memory
//! implementation used by tests and headless embeddings.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::identifiers::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Storage key holding the signed-in user's id.
pub const USER_ID_KEY: &str = "user_id";

/// Storage key holding the session token.
pub const SESSION_TOKEN_KEY: &str = "session_token";

// ============================================================================
// KeyValueStorage
// ============================================================================

/// String key-value storage, the local/session-storage seam.
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value.
    fn set(&self, key: &str, value: &str);

    /// Deletes a value.
    fn remove(&self, key: &str);
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// In-memory [`KeyValueStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

// ============================================================================
// StoredCredentials
// ============================================================================

/// The credential pair used by the authentication handshake.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    /// Authenticating user.
    pub user_id: UserId,
    /// Credential token.
    pub token: String,
}

impl StoredCredentials {
    /// Creates a credential pair.
    #[inline]
    #[must_use]
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: token.into(),
        }
    }

    /// Loads credentials from storage, primary first then fallback per key.
    ///
    /// Returns `None` unless both keys resolve to non-empty values.
    #[must_use]
    pub fn load(
        primary: &dyn KeyValueStorage,
        fallback: &dyn KeyValueStorage,
    ) -> Option<Self> {
        let read = |key: &str| {
            primary
                .get(key)
                .or_else(|| fallback.get(key))
                .filter(|value| !value.is_empty())
        };

        let user_id = UserId::new(read(USER_ID_KEY)?).ok()?;
        let token = read(SESSION_TOKEN_KEY)?;
        Some(Self { user_id, token })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_prefers_primary() {
        let primary = MemoryStorage::new();
        let fallback = MemoryStorage::new();
        primary.set(USER_ID_KEY, "u1");
        primary.set(SESSION_TOKEN_KEY, "tok-primary");
        fallback.set(USER_ID_KEY, "u2");
        fallback.set(SESSION_TOKEN_KEY, "tok-fallback");

        let credentials = StoredCredentials::load(&primary, &fallback).expect("loaded");
        assert_eq!(credentials.user_id.as_str(), "u1");
        assert_eq!(credentials.token, "tok-primary");
    }

    #[test]
    fn test_load_falls_back_per_key() {
        let primary = MemoryStorage::new();
        let fallback = MemoryStorage::new();
        primary.set(USER_ID_KEY, "u1");
        fallback.set(SESSION_TOKEN_KEY, "tok-session");

        let credentials = StoredCredentials::load(&primary, &fallback).expect("loaded");
        assert_eq!(credentials.user_id.as_str(), "u1");
        assert_eq!(credentials.token, "tok-session");
    }

    #[test]
    fn test_load_requires_both_keys() {
        let primary = MemoryStorage::new();
        let fallback = MemoryStorage::new();
        primary.set(USER_ID_KEY, "u1");

        assert!(StoredCredentials::load(&primary, &fallback).is_none());
    }

    #[test]
    fn test_load_rejects_empty_values() {
        let primary = MemoryStorage::new();
        let fallback = MemoryStorage::new();
        primary.set(USER_ID_KEY, "");
        primary.set(SESSION_TOKEN_KEY, "tok");

        assert!(StoredCredentials::load(&primary, &fallback).is_none());
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        storage.set(USER_ID_KEY, "u1");
        storage.remove(USER_ID_KEY);
        assert!(storage.get(USER_ID_KEY).is_none());
    }
}
