//! User session lifecycle: login, registration, logout and boot.
//!
//! A session is derived state: the user counts as signed in while the
//! [`CredentialStore`](crate::auth::CredentialStore) owned by the transport
//! holds a credential pair. [`SessionManager`] additionally keeps a snapshot
//! of the signed-in [`User`], persisted under [`USER_KEY`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::auth::CredentialPair;
use crate::clients::{HttpError, HttpMethod, HttpRequest, Transport};
use crate::storage::{load_json, save_json, KeyValueStore, StorageError, USER_KEY};

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "token/";
/// Path of the registration endpoint.
pub const REGISTER_PATH: &str = "v1/register/";

/// Errors returned by [`SessionManager`] operations.
///
/// The `Display` text is a generic, retryable message suitable for end
/// users; the underlying cause is available through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The login call failed (bad credentials, network failure, ...).
    #[error("Sign-in failed. Please check your details and try again.")]
    Login(#[source] HttpError),

    /// The registration call failed.
    #[error("Registration failed. Please check your details and try again.")]
    Register(#[source] HttpError),

    /// The session could not be persisted.
    #[error("Sign-in could not be completed. Please try again.")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Returns the transport error behind this failure, if any.
    #[must_use]
    pub const fn http_error(&self) -> Option<&HttpError> {
        match self {
            Self::Login(err) | Self::Register(err) => Some(err),
            Self::Storage(_) => None,
        }
    }
}

/// Snapshot of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user id.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Email address, when the backend returns one.
    #[serde(default)]
    pub email: Option<String>,
    /// When this snapshot was taken.
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: u64,
    username: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserPayload,
}

fn registration_payload(name: &str, email: &str, secret: &str) -> serde_json::Value {
    let mut words = name.split_whitespace();
    let first_name = words.next().unwrap_or_default();
    let last_name = words.collect::<Vec<_>>().join(" ");

    json!({
        "username": email,
        "email": email,
        "password": secret,
        "first_name": first_name,
        "last_name": last_name,
    })
}

/// Owns the user identity lifecycle.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = SessionManager::new(Arc::clone(&transport), store);
/// session.boot().await;
///
/// match session.login("ana@example.com", "hunter2").await {
///     Ok(user) => println!("Welcome back, {}", user.username),
///     Err(err) => println!("{err}"),
/// }
/// ```
pub struct SessionManager {
    transport: Arc<Transport>,
    store: Arc<dyn KeyValueStore>,
    user: Option<User>,
}

impl SessionManager {
    /// Creates a session manager, restoring a persisted user snapshot.
    ///
    /// An unreadable snapshot is discarded.
    #[must_use]
    pub fn new(transport: Arc<Transport>, store: Arc<dyn KeyValueStore>) -> Self {
        let user = match load_json::<User>(store.as_ref(), USER_KEY) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable user snapshot");
                None
            }
        };

        Self {
            transport,
            store,
            user,
        }
    }

    /// Returns the transport this manager signs in through.
    #[must_use]
    pub const fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Returns `true` while a credential pair is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.transport.is_authenticated()
    }

    /// Returns the signed-in user, only while credentials are present.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        if self.is_authenticated() {
            self.user.as_ref()
        } else {
            None
        }
    }

    /// Proactively refreshes a persisted session at process start.
    ///
    /// Does nothing when no refresh credential is stored. Any failure
    /// leaves the session signed out and is not reported.
    pub async fn boot(&mut self) {
        if self.transport.credentials().refresh_token().is_none() {
            self.forget_user();
            return;
        }

        match self.transport.refresh().await {
            Ok(()) => tracing::info!("Persisted session restored"),
            Err(err) => {
                tracing::info!(error = %err, "Persisted session could not be restored");
                if let Err(err) = self.transport.credentials().clear() {
                    tracing::warn!(error = %err, "Stale credentials could not be removed");
                }
                self.forget_user();
            }
        }
    }

    /// Signs in with a username (or email) and password.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Login`] for any failed call and
    /// [`SessionError::Storage`] if the session cannot be persisted, in which
    /// case the session is left signed out.
    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<User, SessionError> {
        let request = HttpRequest::builder(HttpMethod::Post, LOGIN_PATH)
            .body(json!({ "username": identifier, "password": secret }))
            .unauthenticated()
            .build()
            .map_err(|err| SessionError::Login(err.into()))?;

        let response: LoginResponse = self
            .transport
            .request_json(request)
            .await
            .map_err(|err| {
                tracing::info!(error = %err, "Login rejected");
                SessionError::Login(err)
            })?;

        let user = User {
            id: response.user.id,
            username: response.user.username,
            email: response.user.email,
            logged_in_at: Utc::now(),
        };
        let pair = CredentialPair::new(response.access, response.refresh);

        if let Err(err) = self.persist_session(pair, &user) {
            tracing::warn!(error = %err, "Session could not be persisted, signing out");
            if let Err(err) = self.transport.credentials().clear() {
                tracing::warn!(error = %err, "Credentials could not be removed from storage");
            }
            self.forget_user();
            return Err(err.into());
        }
        self.user = Some(user.clone());

        tracing::info!(user_id = user.id, "Signed in");
        Ok(user)
    }

    fn persist_session(&self, pair: CredentialPair, user: &User) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), USER_KEY, user)?;
        self.transport.credentials().set(pair)
    }

    /// Creates an account, then signs in with the same email and password.
    ///
    /// The email doubles as the username; the first word of `name` becomes
    /// the first name and the remainder the last name.
    ///
    /// Both calls must succeed for the operation to succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Register`] if the registration call fails,
    /// otherwise any error of [`SessionManager::login`].
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
    ) -> Result<User, SessionError> {
        let request = HttpRequest::builder(HttpMethod::Post, REGISTER_PATH)
            .body(registration_payload(name, email, secret))
            .unauthenticated()
            .build()
            .map_err(|err| SessionError::Register(err.into()))?;

        self.transport.request(request).await.map_err(|err| {
            tracing::info!(error = %err, "Registration rejected");
            SessionError::Register(err)
        })?;

        self.login(email, secret).await
    }

    /// Signs out, clearing credentials and the user snapshot. Idempotent.
    pub fn logout(&mut self) {
        if let Err(err) = self.transport.credentials().clear() {
            tracing::warn!(error = %err, "Credentials could not be removed from storage");
        }
        self.forget_user();
        tracing::info!("Signed out");
    }

    fn forget_user(&mut self) {
        self.user = None;
        if let Err(err) = self.store.remove(USER_KEY) {
            tracing::warn!(error = %err, "User snapshot could not be removed from storage");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
