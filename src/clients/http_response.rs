//! HTTP response types for the storefront client.
//!
//! Besides raw access to status, headers and body, [`HttpResponse`] is where
//! response shapes are normalized: typed decoding via [`HttpResponse::json`]
//! and list decoding via [`HttpResponse::listing`], which accepts both a bare
//! JSON array and the paginated `{"results": [...]}` envelope.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::clients::errors::HttpError;

/// A list endpoint payload in either of the shapes the backend produces.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
}

/// A page of list results after normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total item count across pages, when the backend paginates.
    pub count: Option<u64>,
    /// URL of the next page, if any.
    pub next: Option<String>,
    /// URL of the previous page, if any.
    pub previous: Option<String>,
}

impl<T> Listing<T> {
    fn into_page(self) -> Page<T> {
        match self {
            Self::Plain(items) => Page {
                items,
                count: None,
                next: None,
                previous: None,
            },
            Self::Paginated {
                results,
                count,
                next,
                previous,
            } => Page {
                items: results,
                count,
                next,
                previous,
            },
        }
    }
}

/// An HTTP response from the storefront backend.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lower-cased name.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body (`{}` for an empty body).
    pub body: serde_json::Value,
    /// The request path this response answers, used in error messages.
    pub path: String,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub fn new(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        body: serde_json::Value,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            headers,
            body,
            path: path.into(),
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_value(self.body.clone()).map_err(|source| HttpError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Decodes a list body, accepting a bare array or a pagination envelope.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] if the body is neither shape.
    pub fn listing<T: DeserializeOwned>(&self) -> Result<Page<T>, HttpError> {
        self.json::<Listing<T>>().map(Listing::into_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value) -> HttpResponse {
        HttpResponse::new(200, HashMap::new(), body, "v1/things/")
    }

    #[test]
    fn test_is_ok_boundaries() {
        assert!(HttpResponse::new(204, HashMap::new(), json!({}), "x").is_ok());
        assert!(!HttpResponse::new(199, HashMap::new(), json!({}), "x").is_ok());
        assert!(!HttpResponse::new(401, HashMap::new(), json!({}), "x").is_ok());
    }

    #[test]
    fn test_listing_accepts_bare_array() {
        let page: Page<u32> = response(json!([1, 2, 3])).listing().unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.count.is_none());
    }

    #[test]
    fn test_listing_accepts_paginated_envelope() {
        let page: Page<u32> = response(json!({
            "count": 12,
            "next": "http://api/v1/things/?page=2",
            "previous": null,
            "results": [4, 5]
        }))
        .listing()
        .unwrap();

        assert_eq!(page.items, vec![4, 5]);
        assert_eq!(page.count, Some(12));
        assert_eq!(page.next.as_deref(), Some("http://api/v1/things/?page=2"));
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_listing_rejects_other_shapes() {
        let result: Result<Page<u32>, _> = response(json!({"detail": "nope"})).listing();
        assert!(matches!(result, Err(HttpError::Decode { path, .. }) if path == "v1/things/"));
    }

    #[test]
    fn test_request_id_extraction() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["req-1".to_string()]);
        let response = HttpResponse::new(500, headers, json!({}), "x");
        assert_eq!(response.request_id(), Some("req-1"));
    }
}
