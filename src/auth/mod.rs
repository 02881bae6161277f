//! Authentication types for the storefront client.
//!
//! # Overview
//!
//! - [`CredentialPair`]: An access credential and its refresh credential
//! - [`CredentialStore`]: Persistent holder of the current pair, owned by
//!   the [`Transport`](crate::clients::Transport)
//! - [`SessionManager`]: Login, registration, logout and boot refresh
//! - [`User`]: Snapshot of the signed-in user
//!
//! # Session State
//!
//! A session is not stored directly: the user is signed in while a
//! credential pair is present. The pair is created by a login or refresh and
//! destroyed by a logout or an unrecoverable refresh failure.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storefront_client::auth::{CredentialPair, CredentialStore};
//! use storefront_client::storage::MemoryStore;
//!
//! let credentials = CredentialStore::load(Arc::new(MemoryStore::new())).unwrap();
//! assert!(!credentials.is_authenticated());
//!
//! credentials.set(CredentialPair::new("access", "refresh")).unwrap();
//! assert_eq!(credentials.refresh_token().as_deref(), Some("refresh"));
//! ```

mod credentials;
pub mod session;

pub use credentials::{CredentialPair, CredentialStore};
pub use session::{SessionError, SessionManager, User};
