//! Validated newtype wrappers for configuration values.

use crate::error::ConfigError;
use std::fmt;

/// A validated base URL for the storefront backend API.
///
/// The URL must be absolute with an `http` or `https` scheme. It is
/// normalized to end with a single `/` so endpoint paths such as
/// `v1/cart-items/` can be appended directly.
///
/// # Example
///
/// ```rust
/// use storefront_client::ApiBaseUrl;
///
/// let url = ApiBaseUrl::new("https://shop.example.com/api").unwrap();
/// assert_eq!(url.as_ref(), "https://shop.example.com/api/");
/// assert_eq!(url.join("token/"), "https://shop.example.com/api/token/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiBaseUrl(String);

impl ApiBaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the value is not an
    /// absolute `http(s)` URL with a host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim();

        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| ConfigError::InvalidBaseUrl { url: url.clone() })?;

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        let normalized = format!("{}/", trimmed.trim_end_matches('/'));
        Ok(Self(normalized))
    }

    /// Joins an endpoint path onto the base URL.
    ///
    /// Leading slashes on `path` are ignored so both `"token/"` and
    /// `"/token/"` resolve under the base path.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path.trim_start_matches('/'))
    }
}

impl AsRef<str> for ApiBaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
