//! HTTP client types for storefront backend communication.
//!
//! This module provides the session-aware transport layer. It handles
//! request/response processing, bearer credential attachment and the
//! refresh-and-replay cycle for expired credentials.
//!
//! # Overview
//!
//! - [`Transport`]: The async HTTP transport shared by all components
//! - [`HttpRequest`]: A request to be sent to the backend
//! - [`HttpResponse`]: A parsed response, with typed and list decoding
//! - [`Page`]: A normalized list payload
//! - [`HttpMethod`]: Supported HTTP methods
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::auth::CredentialStore;
//! use storefront_client::clients::{HttpMethod, HttpRequest, Transport};
//! use storefront_client::storage::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let transport = Transport::new(&config, CredentialStore::load(store)?)?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "v1/categories/")
//!     .build()
//!     .unwrap();
//!
//! let response = transport.request(request).await?;
//! ```
//!
//! # Refresh Behavior
//!
//! - **401 on a credentialed request**: one refresh, then one replay
//! - **401 while a refresh is in flight**: the request waits and replays
//! - **401 after the replay**: surfaced as [`AuthFailure::RetryExhausted`]
//! - **Other errors**: returned immediately without retry

mod errors;
mod http_request;
mod http_response;
mod refresh;
mod transport;

pub use errors::{AuthFailure, HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, Page};
pub use transport::{Transport, CLIENT_VERSION, REFRESH_PATH};
