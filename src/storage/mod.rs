//! Client-side key-value persistence.
//!
//! Credentials, the anonymous cart and the user snapshot survive process
//! restarts through a [`KeyValueStore`]. Values are JSON strings; use
//! [`load_json`] and [`save_json`] for typed access.
//!
//! - [`MemoryStore`]: process-local map, used in tests and ephemeral sessions
//! - [`FileStore`]: one JSON file per key under a directory
//!
//! # Key Layout
//!
//! | Key                  | Contents                       |
//! |----------------------|--------------------------------|
//! | [`ACCESS_TOKEN_KEY`] | access credential              |
//! | [`REFRESH_TOKEN_KEY`]| refresh credential             |
//! | [`LOCAL_CART_KEY`]   | array of local cart lines      |
//! | [`USER_KEY`]         | authenticated user snapshot    |

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage key of the access credential.
pub const ACCESS_TOKEN_KEY: &str = "jwt_access";
/// Storage key of the refresh credential.
pub const REFRESH_TOKEN_KEY: &str = "jwt_refresh";
/// Storage key of the local (anonymous) cart lines.
pub const LOCAL_CART_KEY: &str = "cart";
/// Storage key of the authenticated user snapshot.
pub const USER_KEY: &str = "user";

/// Errors raised by a persistence medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying medium could not be read or written.
    #[error("Storage I/O error for key '{key}': {source}")]
    Io {
        /// The key being accessed.
        key: String,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be (de)serialized.
    #[error("Stored value for key '{key}' is not valid JSON for the expected type: {source}")]
    Serialization {
        /// The key being accessed.
        key: String,
        /// The serde failure.
        #[source]
        source: serde_json::Error,
    },
}

/// A string key-value store that outlives the process.
///
/// Implementations use interior mutability so one store can be shared
/// between the credential store, the session manager and the cart engine.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Loads and deserializes the JSON value stored under `key`.
///
/// # Errors
///
/// Returns [`StorageError`] if the read fails or the stored JSON does not
/// match `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

/// Serializes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns [`StorageError`] if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}
