//! Cart reconciliation engine.
//!
//! [`CartEngine`] presents one logical cart whose backing store depends on
//! the session:
//!
//! - **Signed out** ([`CartMode::Local`]): lines live in client-side storage
//!   under [`LOCAL_CART_KEY`](crate::storage::LOCAL_CART_KEY). Every change
//!   rewrites the full line set.
//! - **Signed in** ([`CartMode::Remote`]): the backend is the source of
//!   truth. Every change calls the line endpoint, then reloads the whole
//!   remote cart.
//!
//! # Transitions
//!
//! [`CartEngine::sync_session`] compares the engine mode with the
//! transport's authentication state and performs at most one transition:
//!
//! - **Local to remote**: each local line is sent to the backend with one
//!   add call (the backend sums quantities for products it already holds),
//!   confirmed lines are dropped from local storage, then the remote cart is
//!   reloaded once. Lines the backend rejects stay in local storage and are
//!   reported through [`CartError::PartialMigration`].
//! - **Remote to local**: the remote lines are dropped and the lines last
//!   persisted locally are shown again.
//!
//! Mutations call `sync_session` first, so a session lost to a failed
//! credential refresh moves the cart back to local mode before the change.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_client::cart::CartEngine;
//!
//! let mut cart = CartEngine::new(Arc::clone(&transport), Arc::clone(&store));
//! cart.add_line(product, 2).await?;
//! println!("{} items, total {}", cart.get_count(), cart.get_total());
//! ```

mod errors;
mod line;
mod local;
mod remote;

pub use errors::{CartError, FailedLine, MigrationReport};
pub use line::{CartLine, CartMode, CartSnapshot, LineId};
pub use remote::{RemoteCart, CARTS_PATH, CART_ITEMS_PATH};

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::catalog::{Product, ProductId};
use crate::clients::Transport;
use crate::storage::{KeyValueStore, LOCAL_CART_KEY};
use remote::CartApi;

/// What [`CartEngine::sync_session`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The mode already matched the session.
    Unchanged,
    /// Moved to the backend cart after migrating this many lines.
    ToRemote {
        /// Lines confirmed by the backend.
        migrated: usize,
    },
    /// Moved back to the local cart.
    ToLocal,
}

/// Owns the cart and keeps it consistent with the session.
pub struct CartEngine {
    transport: Arc<Transport>,
    store: Arc<dyn KeyValueStore>,
    api: CartApi,
    mode: CartMode,
    lines: Vec<CartLine>,
    last_migration: Option<MigrationReport>,
    snapshots: watch::Sender<CartSnapshot>,
}

impl CartEngine {
    /// Creates an engine in local mode showing the persisted local lines.
    ///
    /// Call [`CartEngine::sync_session`] afterwards to pick up an existing
    /// session. An unreadable local cart is treated as empty.
    #[must_use]
    pub fn new(transport: Arc<Transport>, store: Arc<dyn KeyValueStore>) -> Self {
        let lines = local::load(store.as_ref()).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Discarding unreadable local cart");
            Vec::new()
        });
        let (snapshots, _) = watch::channel(CartSnapshot {
            mode: CartMode::Local,
            lines: lines.clone(),
        });

        Self {
            api: CartApi::new(Arc::clone(&transport)),
            transport,
            store,
            mode: CartMode::Local,
            lines,
            last_migration: None,
            snapshots,
        }
    }

    /// Returns the authoritative storage domain.
    #[must_use]
    pub const fn mode(&self) -> CartMode {
        self.mode
    }

    /// Returns the current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the line for `product`, if any.
    #[must_use]
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        line::position(&self.lines, product).map(|index| &self.lines[index])
    }

    /// Sum of `price * quantity` over the current lines.
    #[must_use]
    pub fn get_total(&self) -> Decimal {
        line::total(&self.lines)
    }

    /// Sum of quantities over the current lines.
    #[must_use]
    pub fn get_count(&self) -> u64 {
        line::count(&self.lines)
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            mode: self.mode,
            lines: self.lines.clone(),
        }
    }

    /// Subscribes to snapshots published after every successful change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Returns the report of the last migration that left lines behind.
    #[must_use]
    pub const fn last_migration(&self) -> Option<&MigrationReport> {
        self.last_migration.as_ref()
    }

    /// Performs the pending mode transition, if any.
    ///
    /// # Errors
    ///
    /// - [`CartError::PartialMigration`] if some local lines were rejected.
    ///   The engine still switches to remote mode when the session survived.
    /// - [`CartError::Http`] if the remote cart cannot be reloaded. The
    ///   engine is in remote mode and shows an empty cart until the next
    ///   successful [`CartEngine::reload`].
    /// - [`CartError::Storage`] if local storage fails.
    pub async fn sync_session(&mut self) -> Result<Transition, CartError> {
        let wanted = if self.transport.is_authenticated() {
            CartMode::Remote
        } else {
            CartMode::Local
        };

        match (self.mode, wanted) {
            (CartMode::Local, CartMode::Remote) => self.enter_remote().await,
            (CartMode::Remote, CartMode::Local) => {
                self.enter_local()?;
                Ok(Transition::ToLocal)
            }
            _ => Ok(Transition::Unchanged),
        }
    }

    async fn enter_remote(&mut self) -> Result<Transition, CartError> {
        let report = self.migrate().await?;

        if !self.transport.is_authenticated() {
            // The session was lost mid-migration; stay local with what is left.
            self.lines = local::load(self.store.as_ref())?;
            self.publish();
            if report.is_complete() {
                return Ok(Transition::Unchanged);
            }
            self.last_migration = Some(report.clone());
            return Err(CartError::PartialMigration(report));
        }

        self.mode = CartMode::Remote;
        self.last_migration = (!report.is_complete()).then(|| report.clone());
        tracing::info!(
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "Cart switched to remote mode"
        );
        // Local line ids mean nothing to the backend.
        self.lines.clear();
        if let Err(err) = self.load_remote().await {
            self.publish();
            return Err(err);
        }

        if report.is_complete() {
            Ok(Transition::ToRemote {
                migrated: report.migrated.len(),
            })
        } else {
            Err(CartError::PartialMigration(report))
        }
    }

    fn enter_local(&mut self) -> Result<(), CartError> {
        self.mode = CartMode::Local;
        let loaded = local::load(self.store.as_ref());
        self.lines = match &loaded {
            Ok(lines) => lines.clone(),
            Err(_) => Vec::new(),
        };
        self.publish();
        tracing::info!(lines = self.lines.len(), "Cart switched to local mode");
        loaded.map(|_| ()).map_err(CartError::from)
    }

    async fn migrate(&self) -> Result<MigrationReport, CartError> {
        let pending = local::load(self.store.as_ref())?;
        let mut report = MigrationReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut kept = Vec::new();
        for line in pending {
            match self.api.add_line(line.product.id, line.quantity).await {
                Ok(()) => report.migrated.push(line.product.id),
                Err(err) => {
                    tracing::warn!(
                        product = %line.product.id,
                        error = %err,
                        "Cart line could not be migrated"
                    );
                    report.failed.push(FailedLine {
                        product: line.product.id,
                        quantity: line.quantity,
                        reason: err.to_string(),
                    });
                    kept.push(line);
                }
            }
        }

        if kept.is_empty() {
            self.store.remove(LOCAL_CART_KEY)?;
        } else {
            local::persist(self.store.as_ref(), &kept)?;
        }
        Ok(report)
    }

    /// Reloads the lines from the authoritative store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the load fails; the previous lines are kept.
    pub async fn reload(&mut self) -> Result<(), CartError> {
        match self.mode {
            CartMode::Local => {
                self.lines = local::load(self.store.as_ref())?;
                self.publish();
                Ok(())
            }
            CartMode::Remote => self.load_remote().await,
        }
    }

    async fn load_remote(&mut self) -> Result<(), CartError> {
        let lines = self.api.list_lines().await?;
        self.lines = lines;
        self.publish();
        Ok(())
    }

    /// Returns the backend cart, creating it if the user has none.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Http`] if either call fails.
    pub async fn ensure_remote_cart(&self) -> Result<RemoteCart, CartError> {
        Ok(self.api.ensure_cart().await?)
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    ///
    /// Adding zero units does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the change cannot be stored; the previous
    /// lines are kept.
    pub async fn add_line(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        self.follow_session().await?;
        if quantity == 0 {
            return Ok(());
        }

        match self.mode {
            CartMode::Local => {
                let mut next = self.lines.clone();
                local::add(&mut next, product, quantity);
                self.commit_local(next)
            }
            CartMode::Remote => {
                self.api.add_line(product.id, quantity).await?;
                self.load_remote().await
            }
        }
    }

    /// Sets the quantity of the line for `product`.
    ///
    /// A quantity of zero or less removes the line. In remote mode a
    /// product without a line is added.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the change cannot be stored; the previous
    /// lines are kept.
    pub async fn update_quantity(
        &mut self,
        product: ProductId,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_line(product).await;
        }
        self.follow_session().await?;
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        match self.mode {
            CartMode::Local => {
                let mut next = self.lines.clone();
                if !local::set_quantity(&mut next, product, quantity) {
                    return Ok(());
                }
                self.commit_local(next)
            }
            CartMode::Remote => {
                match self.line(product).map(|line| line.id) {
                    Some(line) => self.api.update_line(line, quantity).await?,
                    None => self.api.add_line(product, quantity).await?,
                }
                self.load_remote().await
            }
        }
    }

    /// Removes the line for `product`. Absent products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the change cannot be stored; the previous
    /// lines are kept.
    pub async fn remove_line(&mut self, product: ProductId) -> Result<(), CartError> {
        self.follow_session().await?;

        match self.mode {
            CartMode::Local => {
                let mut next = self.lines.clone();
                if !local::remove(&mut next, product) {
                    return Ok(());
                }
                self.commit_local(next)
            }
            CartMode::Remote => {
                let Some(line) = self.line(product).map(|line| line.id) else {
                    return Ok(());
                };
                self.api.remove_line(line).await?;
                self.load_remote().await
            }
        }
    }

    /// Removes every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] on the first failed removal. In remote mode the
    /// cart is reloaded only after every line was removed.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.follow_session().await?;

        match self.mode {
            CartMode::Local => {
                self.store.remove(LOCAL_CART_KEY)?;
                self.lines.clear();
                self.publish();
                Ok(())
            }
            CartMode::Remote => {
                let ids: Vec<LineId> = self.lines.iter().map(|line| line.id).collect();
                for id in ids {
                    self.api.remove_line(id).await?;
                }
                self.load_remote().await
            }
        }
    }

    /// Runs a pending transition before a mutation. A partial migration is
    /// recorded but does not block the mutation.
    async fn follow_session(&mut self) -> Result<(), CartError> {
        match self.sync_session().await {
            Ok(_) => Ok(()),
            Err(CartError::PartialMigration(report)) => {
                tracing::warn!(%report, "Continuing after partial cart migration");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn commit_local(&mut self, next: Vec<CartLine>) -> Result<(), CartError> {
        local::persist(self.store.as_ref(), &next)?;
        self.lines = next;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

impl fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartEngine")
            .field("mode", &self.mode)
            .field("lines", &self.lines.len())
            .field("last_migration", &self.last_migration)
            .finish_non_exhaustive()
    }
}
