//! Entry point wiring the transport, session, catalog and cart together.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{CredentialStore, SessionError, SessionManager, User};
use crate::cart::{CartEngine, CartError, MigrationReport, Transition};
use crate::catalog::Catalog;
use crate::clients::{HttpError, Transport};
use crate::config::StorefrontConfig;
use crate::storage::{KeyValueStore, StorageError};

/// Errors raised while opening a [`Storefront`].
#[derive(Debug, Error)]
pub enum OpenError {
    /// Persisted state could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The HTTP client could not be created.
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// A storefront client session.
///
/// Session changes made through [`Storefront::login`],
/// [`Storefront::register`] and [`Storefront::logout`] move the cart between
/// local and remote mode. A failed cart migration never fails the session
/// change; inspect [`Storefront::last_migration`] instead.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use storefront_client::{FileStore, Storefront, StorefrontConfig};
///
/// let config = StorefrontConfig::from_env()?;
/// let store = Arc::new(FileStore::open("/var/lib/storefront")?);
/// let mut storefront = Storefront::open(&config, store).await?;
///
/// storefront.cart_mut().add_line(product, 1).await?;
/// storefront.login("ana@example.com", "hunter2").await?;
/// assert_eq!(storefront.cart().mode(), CartMode::Remote);
/// ```
#[derive(Debug)]
pub struct Storefront {
    transport: Arc<Transport>,
    session: SessionManager,
    catalog: Catalog,
    cart: CartEngine,
}

impl Storefront {
    /// Opens a storefront on top of `store`.
    ///
    /// Restores a persisted session with one proactive refresh, then puts
    /// the cart in the matching mode.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] if persisted credentials cannot be read or the
    /// HTTP client cannot be created. Refresh and cart failures are logged.
    pub async fn open(
        config: &StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, OpenError> {
        let credentials = CredentialStore::load(Arc::clone(&store))?;
        let transport = Arc::new(Transport::new(config, credentials)?);

        let mut session = SessionManager::new(Arc::clone(&transport), Arc::clone(&store));
        session.boot().await;

        let mut storefront = Self {
            catalog: Catalog::new(Arc::clone(&transport)),
            cart: CartEngine::new(Arc::clone(&transport), store),
            transport,
            session,
        };
        storefront.sync_cart().await;

        Ok(storefront)
    }

    /// Returns the shared transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Returns the session manager.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Returns the catalog client.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the cart.
    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Returns the cart for mutation.
    pub fn cart_mut(&mut self) -> &mut CartEngine {
        &mut self.cart
    }

    /// Returns `true` while a credential pair is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Returns the signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    /// Returns the report of the last cart migration that left lines behind.
    #[must_use]
    pub const fn last_migration(&self) -> Option<&MigrationReport> {
        self.cart.last_migration()
    }

    /// Signs in and moves the local cart to the account.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the sign-in fails.
    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<User, SessionError> {
        let user = self.session.login(identifier, secret).await?;
        self.sync_cart().await;
        Ok(user)
    }

    /// Creates an account, signs in and moves the local cart to the account.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if registration or the sign-in fails.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
    ) -> Result<User, SessionError> {
        let user = self.session.register(name, email, secret).await?;
        self.sync_cart().await;
        Ok(user)
    }

    /// Signs out and shows the local cart again. Idempotent.
    pub async fn logout(&mut self) {
        self.session.logout();
        self.sync_cart().await;
    }

    async fn sync_cart(&mut self) {
        match self.cart.sync_session().await {
            Ok(Transition::Unchanged) => {}
            Ok(transition) => tracing::debug!(?transition, "Cart followed session change"),
            Err(CartError::PartialMigration(report)) => {
                tracing::warn!(%report, "Cart migration incomplete");
            }
            Err(err) => tracing::warn!(error = %err, "Cart could not follow session change"),
        }
    }
}
