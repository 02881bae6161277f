//! Configuration error types for the storefront client.
//!
//! All configuration constructors return `Result<T, ConfigError>` so invalid
//! values are rejected when the client is assembled rather than on the first
//! request.
//!
//! # Example
//!
//! ```rust
//! use storefront_client::{ApiBaseUrl, ConfigError};
//!
//! let result = ApiBaseUrl::new("not a url");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while building a [`StorefrontConfig`](crate::StorefrontConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base URL is not an absolute `http`/`https` URL.
    #[error("Invalid API base URL '{url}'. Expected an absolute URL such as 'https://api.example.com/api/'.")]
    InvalidBaseUrl {
        /// The URL that was provided.
        url: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// The request timeout could not be parsed or is zero.
    #[error("Invalid request timeout '{value}'. Expected a positive number of seconds.")]
    InvalidTimeout {
        /// The raw value that was provided.
        value: String,
    },
}
