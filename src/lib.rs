//! # Storefront Client
//!
//! A session-aware client for the storefront backend, paired with a cart
//! that follows the user across the signed-out and signed-in states.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`StorefrontConfig`] and [`StorefrontConfigBuilder`]
//! - Persistent client-side state via [`storage::KeyValueStore`]
//! - An async HTTP [`Transport`] that attaches bearer credentials and
//!   refreshes them at most once at a time, replaying the requests that
//!   failed while the refresh was in flight
//! - Login, registration, logout and boot refresh via [`SessionManager`]
//! - Catalog access via [`catalog::Catalog`]
//! - A [`CartEngine`] that keeps one logical cart in local storage while
//!   signed out, on the backend while signed in, and migrates lines when the
//!   session changes
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_client::{StorefrontConfig, ApiBaseUrl};
//!
//! let config = StorefrontConfig::builder()
//!     .api_base_url(ApiBaseUrl::new("https://shop.example.com/api/").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_base_url().as_ref(), "https://shop.example.com/api/");
//! ```
//!
//! ## Opening a Storefront
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::{FileStore, Storefront, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let store = Arc::new(FileStore::open("./state")?);
//!
//! // Restores a persisted session (one proactive refresh) and puts the
//! // cart in the matching mode.
//! let mut storefront = Storefront::open(&config, store).await?;
//!
//! let bear = storefront.catalog().get_product(ProductId(3)).await?;
//! storefront.cart_mut().add_line(bear, 2).await?;
//!
//! // Local lines move to the account cart on sign-in.
//! storefront.login("ana@example.com", "hunter2").await?;
//! println!("{} items", storefront.cart().get_count());
//! ```
//!
//! ## Using the Transport Directly
//!
//! ```rust,ignore
//! use storefront_client::clients::{HttpMethod, HttpRequest};
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "v1/cart-items/")
//!     .build()
//!     .unwrap();
//!
//! // A 401 triggers one refresh and one replay; concurrent 401s share it.
//! let response = storefront.transport().request(request).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Credentials and the refresh gate are fields of the
//!   [`Transport`], injected into the services that need them
//! - **Fail-fast validation**: Configuration newtypes validate on construction
//! - **Thread-safe**: Shared types are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio async runtime
//! - **Normalize at the boundary**: Loose response shapes are resolved into
//!   typed values once, when a response is decoded

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod error;
pub mod storage;
mod storefront;

// Re-export public types at crate root for convenience
pub use auth::{CredentialPair, CredentialStore, SessionError, SessionManager, User};
pub use cart::{CartEngine, CartError, CartLine, CartMode, CartSnapshot, MigrationReport};
pub use catalog::{Catalog, Product, ProductId};
pub use config::{ApiBaseUrl, StorefrontConfig, StorefrontConfigBuilder};
pub use error::ConfigError;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use storefront::{OpenError, Storefront};

// Re-export HTTP client types
pub use clients::{AuthFailure, HttpError, HttpMethod, HttpRequest, HttpResponse, Transport};
