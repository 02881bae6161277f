//! HTTP-specific error types for the storefront client.
//!
//! - [`HttpResponseError`]: non-2xx responses other than an exhausted 401
//! - [`AuthFailure`]: why an authorization failure reached the caller
//! - [`InvalidHttpRequestError`]: a request that fails validation before sending
//! - [`HttpError`]: unified error type encompassing all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_client::clients::{HttpError, AuthFailure};
//!
//! match transport.request(request).await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Unauthorized(AuthFailure::RefreshRejected { .. })) => {
//!         println!("Session expired, please sign in again");
//!     }
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//!     Err(other) => println!("{other}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when a request receives a non-successful response.
///
/// The message is the JSON error payload reduced to the fields the backend
/// uses for error reporting (`detail`, `errors`, `error`,
/// `non_field_errors` and per-field messages).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error message in JSON format.
    pub message: String,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub error_reference: Option<String>,
}

impl HttpResponseError {
    /// Returns `true` for 4xx responses (rejected input).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.code >= 400 && self.code <= 499
    }
}

/// Reason an authorization failure was surfaced instead of handled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// A 401 was received and no refresh credential is stored.
    #[error("Authorization failed and no refresh credential is available")]
    NoRefreshCredential,

    /// The refresh endpoint rejected the refresh credential or was unreachable.
    /// Stored credentials have been cleared.
    #[error("Credential refresh failed{}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    RefreshRejected {
        /// Status returned by the refresh endpoint, `None` for network failures.
        status: Option<u16>,
    },

    /// The task driving the refresh was dropped before it finished.
    #[error("Credential refresh was abandoned before completing")]
    RefreshAbandoned,

    /// The request was replayed with a refreshed credential and still got 401.
    #[error("Authorization failed after credential refresh")]
    RetryExhausted,
}

/// Error returned when a request fails validation before being sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Unified error type for all transport errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response other than an unrecoverable 401.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Authorization failed and could not be recovered by a refresh.
    #[error(transparent)]
    Unauthorized(#[from] AuthFailure),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error (no response was received).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("Unexpected response body for '{path}': {source}")]
    Decode {
        /// The request path whose response failed to decode.
        path: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// Returns `true` if this error is an authorization failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::Unauthorized(_) => Some(401),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidRequest(_) | Self::Decode { .. } => None,
        }
    }
}
