//! Access/refresh credential pair and its persistent store.
//!
//! Token contents are opaque: nothing here parses or validates them. The
//! `Debug` output of [`CredentialPair`] masks both values.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::storage::{
    load_json, save_json, KeyValueStore, StorageError, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};

/// An access credential together with the refresh credential that renews it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived credential attached to API requests.
    pub access: String,
    /// Longer-lived credential used to obtain a new access credential.
    pub refresh: String,
}

impl CredentialPair {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Returns the `Authorization` header value for the access credential.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access)
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"*****")
            .field("refresh", &"*****")
            .finish()
    }
}

/// Holds the current [`CredentialPair`] and mirrors it into a
/// [`KeyValueStore`] under [`ACCESS_TOKEN_KEY`] and [`REFRESH_TOKEN_KEY`].
///
/// Reads are served from memory; writes update memory first and then the
/// persistence medium. A partial pair found on disk (one key without the
/// other) is treated as absent.
pub struct CredentialStore {
    current: Mutex<Option<CredentialPair>>,
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    /// Loads the persisted pair from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if either key cannot be read.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let access: Option<String> = load_json(store.as_ref(), ACCESS_TOKEN_KEY)?;
        let refresh: Option<String> = load_json(store.as_ref(), REFRESH_TOKEN_KEY)?;

        let current = match (access, refresh) {
            (Some(access), Some(refresh)) => Some(CredentialPair { access, refresh }),
            (None, None) => None,
            _ => {
                tracing::warn!("Discarding partially persisted credential pair");
                None
            }
        };

        Ok(Self {
            current: Mutex::new(current),
            store,
        })
    }

    /// Returns the current pair, if any.
    #[must_use]
    pub fn get(&self) -> Option<CredentialPair> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current access credential, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get().map(|pair| pair.access)
    }

    /// Returns the current refresh credential, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get().map(|pair| pair.refresh)
    }

    /// Returns `true` while an access credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Replaces the current pair.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the pair could not be persisted. The
    /// in-memory pair is updated regardless.
    pub fn set(&self, pair: CredentialPair) -> Result<(), StorageError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        save_json(self.store.as_ref(), ACCESS_TOKEN_KEY, &pair.access)?;
        save_json(self.store.as_ref(), REFRESH_TOKEN_KEY, &pair.refresh)
    }

    /// Drops the current pair from memory and from the persistence medium.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a key could not be removed. The in-memory
    /// pair is cleared regardless.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CredentialStore>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_set_persists_both_keys() {
        let store = memory();
        let credentials = CredentialStore::load(Arc::clone(&store)).unwrap();

        credentials.set(CredentialPair::new("a-1", "r-1")).unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("\"a-1\""));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("\"r-1\""));
        assert!(credentials.is_authenticated());
        assert_eq!(credentials.access_token().as_deref(), Some("a-1"));
    }

    #[test]
    fn test_load_restores_persisted_pair() {
        let store = memory();
        CredentialStore::load(Arc::clone(&store))
            .unwrap()
            .set(CredentialPair::new("a-1", "r-1"))
            .unwrap();

        let reloaded = CredentialStore::load(store).unwrap();
        assert_eq!(reloaded.get(), Some(CredentialPair::new("a-1", "r-1")));
    }

    #[test]
    fn test_partial_pair_is_treated_as_absent() {
        let store = memory();
        store.set(REFRESH_TOKEN_KEY, "\"r-1\"").unwrap();

        let credentials = CredentialStore::load(store).unwrap();
        assert!(credentials.get().is_none());
        assert!(credentials.refresh_token().is_none());
    }

    #[test]
    fn test_clear_removes_both_keys_and_is_idempotent() {
        let store = memory();
        let credentials = CredentialStore::load(Arc::clone(&store)).unwrap();
        credentials.set(CredentialPair::new("a-1", "r-1")).unwrap();

        credentials.clear().unwrap();
        credentials.clear().unwrap();

        assert!(!credentials.is_authenticated());
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_debug_masks_tokens() {
        let pair = CredentialPair::new("secret-access", "secret-refresh");
        let debug = format!("{pair:?}");
        assert!(debug.contains("*****"));
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_bearer_format() {
        let pair = CredentialPair::new("abc", "def");
        assert_eq!(pair.bearer(), "Bearer abc");
    }
}
