//! Authenticated transport for the storefront backend.
//!
//! [`Transport`] attaches the stored access credential to outbound requests,
//! intercepts authorization failures, refreshes the credential (at most once
//! at a time, see [`refresh`](super::refresh)) and replays the failed request.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::{CredentialPair, CredentialStore};
use crate::clients::errors::{AuthFailure, HttpError, HttpResponseError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::refresh::{self, Decision, Entry, RefreshGate};
use crate::config::{ApiBaseUrl, StorefrontConfig};

/// Client library version, used in the `User-Agent` header.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Path of the credential refresh endpoint.
pub const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Session-aware HTTP transport.
///
/// The transport exclusively owns the [`CredentialStore`]; other components
/// reach it through [`Transport::credentials`]. Share a transport between
/// components with `Arc<Transport>`.
///
/// # Refresh Behavior
///
/// When a request that carries credentials receives `401 Unauthorized`:
///
/// 1. the request is marked as retried (it is never refreshed twice);
/// 2. if a refresh is already in flight, the request waits for its outcome;
/// 3. otherwise it calls [`REFRESH_PATH`] with the stored refresh credential;
/// 4. on success every waiting request is replayed with the new credential,
///    on failure stored credentials are cleared and every waiting request
///    fails with [`HttpError::Unauthorized`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use storefront_client::clients::{HttpMethod, HttpRequest, Transport};
/// use storefront_client::auth::CredentialStore;
///
/// let credentials = CredentialStore::load(store)?;
/// let transport = Transport::new(&config, credentials)?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "v1/cart-items/").build()?;
/// let response = transport.request(request).await?;
/// ```
#[derive(Debug)]
pub struct Transport {
    client: reqwest::Client,
    base_url: ApiBaseUrl,
    default_headers: HashMap<String, String>,
    credentials: CredentialStore,
    gate: RefreshGate,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Transport>();
};

impl Transport {
    /// Creates a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying HTTP client cannot be
    /// created (for example when TLS initialization fails).
    pub fn new(config: &StorefrontConfig, credentials: CredentialStore) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}Storefront Client v{CLIENT_VERSION} | Rust");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url().clone(),
            default_headers,
            credentials,
            gate: RefreshGate::new(),
        })
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &ApiBaseUrl {
        &self.base_url
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the credential store owned by this transport.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Returns `true` while an access credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Returns `true` while a credential refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.gate.is_refreshing()
    }

    /// Sends a request, transparently refreshing an expired credential.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - request validation fails (`InvalidRequest`)
    /// - no response is received (`Network`)
    /// - the credential is rejected and cannot be refreshed, or is rejected
    ///   again after the refresh (`Unauthorized`)
    /// - any other non-2xx response is received (`Response`)
    pub async fn request(&self, mut request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let sent_with = if request.authenticated {
            self.credentials.get()
        } else {
            None
        };
        let response = self.send(&request, sent_with.as_ref()).await?;

        if response.code != 401 || !request.authenticated || request.retried {
            return Self::finish(&request, response);
        }

        request.retried = true;
        tracing::debug!(path = %request.path, "Access credential rejected, coordinating refresh");
        self.await_fresh_credentials(sent_with.as_ref().map(|pair| pair.access.as_str()))
            .await?;

        let current = self.credentials.get();
        let response = self.send(&request, current.as_ref()).await?;
        Self::finish(&request, response)
    }

    /// Sends a request and decodes its body into `T`.
    ///
    /// # Errors
    ///
    /// Returns every error of [`Transport::request`], plus
    /// [`HttpError::Decode`] when the body does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, HttpError> {
        self.request(request).await?.json()
    }

    /// Refreshes the access credential now.
    ///
    /// Joins an in-flight refresh instead of starting a second one.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Unauthorized`] if no refresh credential is
    /// stored or the refresh fails. A failed refresh clears credentials.
    pub async fn refresh(&self) -> Result<(), HttpError> {
        let entry = self.gate.enter(|| {
            if self.credentials.is_authenticated() {
                Decision::Refresh
            } else {
                Decision::Fail(AuthFailure::NoRefreshCredential)
            }
        });
        self.resolve(entry).await.map_err(HttpError::from)
    }

    async fn await_fresh_credentials(&self, sent_with: Option<&str>) -> Result<(), AuthFailure> {
        let entry = self.gate.enter(|| match self.credentials.get() {
            Some(pair) if Some(pair.access.as_str()) != sent_with => Decision::Replay,
            Some(_) => Decision::Refresh,
            None => Decision::Fail(AuthFailure::NoRefreshCredential),
        });
        self.resolve(entry).await
    }

    async fn resolve(&self, entry: Entry<'_>) -> Result<(), AuthFailure> {
        match entry {
            Entry::Lead(lease) => {
                let outcome = self.perform_refresh().await;
                lease.settle(outcome);
                outcome
            }
            Entry::Wait(rx) => refresh::wait(rx).await,
            Entry::Replay => Ok(()),
            Entry::Fail(failure) => Err(failure),
        }
    }

    async fn perform_refresh(&self) -> Result<(), AuthFailure> {
        let Some(pair) = self.credentials.get() else {
            return Err(AuthFailure::NoRefreshCredential);
        };

        let request = HttpRequest {
            http_method: HttpMethod::Post,
            path: REFRESH_PATH.to_string(),
            body: Some(serde_json::json!({ "refresh": pair.refresh })),
            query: None,
            extra_headers: None,
            authenticated: false,
            retried: false,
        };

        let outcome = match self.send(&request, None).await {
            Ok(response) if response.is_ok() => {
                response.json::<RefreshResponse>().map_err(|err| {
                    tracing::warn!(error = %err, "Refresh endpoint returned an unexpected body");
                    AuthFailure::RefreshRejected {
                        status: Some(response.code),
                    }
                })
            }
            Ok(response) => Err(AuthFailure::RefreshRejected {
                status: Some(response.code),
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Refresh endpoint unreachable");
                Err(AuthFailure::RefreshRejected { status: None })
            }
        };

        match outcome {
            Ok(tokens) => {
                let refresh = tokens.refresh.unwrap_or(pair.refresh);
                if let Err(err) = self.credentials.set(CredentialPair::new(tokens.access, refresh)) {
                    tracing::warn!(error = %err, "Refreshed credentials could not be persisted");
                }
                tracing::info!("Access credential refreshed");
                Ok(())
            }
            Err(failure) => {
                if let Err(err) = self.credentials.clear() {
                    tracing::warn!(error = %err, "Stale credentials could not be removed");
                }
                tracing::warn!(%failure, "Credential refresh failed, credentials cleared");
                Err(failure)
            }
        }
    }

    fn finish(request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse, HttpError> {
        if response.is_ok() {
            return Ok(response);
        }

        if response.code == 401 && request.authenticated {
            return Err(AuthFailure::RetryExhausted.into());
        }

        Err(HttpResponseError {
            code: response.code,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
        }
        .into())
    }

    async fn send(
        &self,
        request: &HttpRequest,
        credentials: Option<&CredentialPair>,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.base_url.join(&request.path);

        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(pair) = credentials {
            headers.insert("Authorization".to_string(), pair.bearer());
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await.unwrap_or_default();

        let body = if body_text.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text).unwrap_or_else(|_| {
                if code >= 500 {
                    serde_json::json!({ "raw_body": body_text })
                } else {
                    serde_json::json!({})
                }
            })
        };

        tracing::debug!(
            method = %request.http_method,
            path = %request.path,
            status = code,
            retried = request.retried,
            "Storefront API request completed"
        );

        Ok(HttpResponse::new(code, res_headers, body, request.path.clone()))
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Reduces an error body to the fields the backend reports errors with.
    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        if let Some(body) = response.body.as_object() {
            for key in ["detail", "error", "errors", "non_field_errors", "raw_body"] {
                if let Some(value) = body.get(key) {
                    error_body.insert(key.to_string(), value.clone());
                }
            }
            if error_body.is_empty() {
                error_body.extend(body.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}
