//! Configuration types for the storefront client.
//!
//! - [`StorefrontConfig`]: settings shared by the transport and services
//! - [`StorefrontConfigBuilder`]: fluent builder for [`StorefrontConfig`]
//! - [`ApiBaseUrl`]: validated backend base URL
//!
//! # Example
//!
//! ```rust
//! use storefront_client::{StorefrontConfig, ApiBaseUrl};
//! use std::time::Duration;
//!
//! let config = StorefrontConfig::builder()
//!     .api_base_url(ApiBaseUrl::new("https://shop.example.com/api/").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.timeout(), Duration::from_secs(10));
//! ```

mod newtypes;

pub use newtypes::ApiBaseUrl;

use crate::error::ConfigError;
use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const ENV_API_BASE_URL: &str = "STOREFRONT_API_BASE_URL";
/// Environment variable holding the optional `User-Agent` prefix.
pub const ENV_USER_AGENT_PREFIX: &str = "STOREFRONT_USER_AGENT_PREFIX";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "STOREFRONT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the storefront client.
///
/// `StorefrontConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct StorefrontConfig {
    api_base_url: ApiBaseUrl,
    user_agent_prefix: Option<String>,
    timeout: Duration,
}

impl StorefrontConfig {
    /// Creates a new builder for constructing a `StorefrontConfig`.
    #[must_use]
    pub fn builder() -> StorefrontConfigBuilder {
        StorefrontConfigBuilder::new()
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Recognized keys are [`ENV_API_BASE_URL`] (required),
    /// [`ENV_USER_AGENT_PREFIX`] and [`ENV_TIMEOUT_SECS`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] when the base URL is
    /// absent, [`ConfigError::InvalidBaseUrl`] when it is malformed and
    /// [`ConfigError::InvalidTimeout`] when the timeout is not a positive
    /// integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(url) = lookup(ENV_API_BASE_URL) {
            builder = builder.api_base_url(ApiBaseUrl::new(url)?);
        }

        if let Some(prefix) = lookup(ENV_USER_AGENT_PREFIX).filter(|p| !p.trim().is_empty()) {
            builder = builder.user_agent_prefix(prefix);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn api_base_url(&self) -> &ApiBaseUrl {
        &self.api_base_url
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StorefrontConfig>();
};

/// Builder for constructing [`StorefrontConfig`] instances.
///
/// Only `api_base_url` is required.
///
/// # Defaults
///
/// - `timeout`: 30 seconds
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct StorefrontConfigBuilder {
    api_base_url: Option<ApiBaseUrl>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl StorefrontConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL (required).
    #[must_use]
    pub fn api_base_url(mut self, url: ApiBaseUrl) -> Self {
        self.api_base_url = Some(url);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`StorefrontConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_base_url` is not
    /// set, or [`ConfigError::InvalidTimeout`] for a zero timeout.
    pub fn build(self) -> Result<StorefrontConfig, ConfigError> {
        let api_base_url = self.api_base_url.ok_or(ConfigError::MissingRequiredField {
            field: "api_base_url",
        })?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                value: "0".to_string(),
            });
        }

        Ok(StorefrontConfig {
            api_base_url,
            user_agent_prefix: self.user_agent_prefix,
            timeout,
        })
    }
}
