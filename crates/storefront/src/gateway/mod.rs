//! Request gateway: the single HTTP path to the Soil2Spoon backend.
//!
//! # Responsibilities
//!
//! - Resolve relative paths against the configured base URL
//! - Attach `Content-Type: application/json` and, when a token is set,
//!   `Authorization: Bearer <token>`
//! - Map non-2xx responses to [`ApiError::Http`] with the backend message
//! - Collapse concurrent identical reads into one network call
//!
//! # Deduplication
//!
//! A request is deduplicable when its method is `GET` and it carries no body.
//! While such a request is in flight, any identical request (same resolved
//! URL) awaits the same result instead of hitting the network again. The
//! entry is dropped as soon as the call settles, success or failure, so this
//! is not a cache.

mod error;
mod pending;

use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::config::StorefrontConfig;

pub use error::ApiError;
pub(crate) use error::is_json_content_type;
use pending::PendingRequests;

// =============================================================================
// Request / Response
// =============================================================================

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    /// HTTP 204.
    Empty,
    /// Parsed JSON (content type indicated JSON).
    Json(Value),
    /// Raw text for any other content type.
    Text(String),
}

impl ApiPayload {
    /// Decode the payload into `T`.
    ///
    /// `Empty` decodes as JSON `null` (so `Option<T>` and `()` work) and
    /// `Text` decodes as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let value = match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        };
        serde_json::from_value(value).map_err(ApiError::decode)
    }
}

/// Per-request options. Defaults to a bodiless `GET`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    body: Option<String>,
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options for the given method.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Encode` if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_string(body).map_err(ApiError::encode)?);
        Ok(self)
    }

    /// Add an extra header. Overrides the default `Content-Type`.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether identical in-flight requests may share one network call.
    #[must_use]
    pub fn is_deduplicable(&self) -> bool {
        self.method == Method::GET && self.body.is_none()
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Soil2Spoon REST API.
///
/// Cheap to clone; all clones share the token slot and the in-flight
/// registry, so one instance per process is the intended shape.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<SecretString>>,
    pending: PendingRequests,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("has_token", &self.bearer_token().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built
    /// (e.g. TLS backend initialisation failure).
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                token: RwLock::new(None),
                pending: PendingRequests::default(),
            }),
        })
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Repoint the bearer token. Takes effect for the next request sent.
    pub fn set_token(&self, token: Option<SecretString>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Number of deduplicated reads currently in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    fn bearer_token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .filter(|t| !t.is_empty())
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{path}", self.inner.base_url)
        }
    }

    /// Perform a request.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` on transport failure
    /// - `ApiError::Http` on a non-2xx status
    /// - `ApiError::Decode` if a JSON response does not parse
    /// - `ApiError::TaskFailed` if a shared read's task panicked
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiPayload, ApiError> {
        let url = self.resolve_url(path);

        if !options.is_deduplicable() {
            return self.send(&url, options).await;
        }

        // The call runs on its own task so it settles, and leaves the
        // registry, even if every waiter is dropped.
        let (response, joined) = self.inner.pending.join_or_start(&url, || {
            let client = self.clone();
            let key = url.clone();
            let call = tokio::spawn(async move {
                let result = client.send(&key, options).await;
                client.inner.pending.remove(&key);
                result
            });
            async move {
                call.await.unwrap_or_else(|e| {
                    error!(error = %e, "Deduplicated request task failed");
                    Err(ApiError::TaskFailed(e.to_string()))
                })
            }
            .boxed()
        });

        if joined {
            debug!(url = %url, "Joined in-flight request");
        }

        response.await
    }

    #[instrument(skip(self, options), fields(method = %options.method))]
    async fn send(&self, url: &str, options: RequestOptions) -> Result<ApiPayload, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
            headers.insert(name, value);
        }
        if let Some(token) = self.bearer_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self
            .inner
            .client
            .request(options.method, url)
            .headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Request failed before a response arrived");
            ApiError::from(e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() {
            let text = response.text().await?;
            let err = ApiError::from_response(status, content_type.as_deref(), &text);
            warn!(url = %url, status = %status, error = %err, "Backend returned non-success status");
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiPayload::Empty);
        }

        let text = response.text().await?;
        if content_type.as_deref().is_some_and(is_json_content_type) {
            serde_json::from_str(&text)
                .map(ApiPayload::Json)
                .map_err(|e| {
                    error!(url = %url, error = %e, "Failed to parse JSON response");
                    ApiError::decode(e)
                })
        } else {
            Ok(ApiPayload::Text(text))
        }
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// `GET` a path and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::default())
            .await?
            .decode()
    }

    /// `POST` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::new(Method::POST).json(body)?)
            .await?
            .decode()
    }

    /// `PUT` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::new(Method::PUT).json(body)?)
            .await?
            .decode()
    }

    /// `DELETE` a path, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(path, RequestOptions::new(Method::DELETE))
            .await
            .map(drop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&StorefrontConfig::new("http://127.0.0.1:9").unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_url() {
        let api = client();
        assert_eq!(
            api.resolve_url("/api/products"),
            "http://127.0.0.1:9/api/products"
        );
        assert_eq!(
            api.resolve_url("https://cdn.example/x.json"),
            "https://cdn.example/x.json"
        );
    }

    #[test]
    fn test_deduplicable_only_for_bodiless_get() {
        assert!(RequestOptions::default().is_deduplicable());
        assert!(!RequestOptions::new(Method::POST).is_deduplicable());
        let get_with_body = RequestOptions::new(Method::GET).json(&json!({"q": 1})).unwrap();
        assert!(!get_with_body.is_deduplicable());
    }

    #[test]
    fn test_empty_token_is_not_sent() {
        let api = client();
        api.set_token(Some(SecretString::from(String::new())));
        assert!(api.bearer_token().is_none());
        api.set_token(Some(SecretString::from("abc".to_string())));
        assert_eq!(api.bearer_token().as_deref(), Some("abc"));
        api.set_token(None);
        assert!(api.bearer_token().is_none());
    }

    #[test]
    fn test_payload_decode() {
        let n: Option<u32> = ApiPayload::Empty.decode().unwrap();
        assert_eq!(n, None);
        let s: String = ApiPayload::Text("hi".into()).decode().unwrap();
        assert_eq!(s, "hi");
        let err = ApiPayload::Json(json!({"a": 1})).decode::<Vec<u32>>();
        assert!(matches!(err, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_debug_hides_token() {
        let api = client();
        api.set_token(Some(SecretString::from("super-secret".to_string())));
        let rendered = format!("{api:?}");
        assert!(rendered.contains("has_token: true"));
        assert!(!rendered.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_transport_failure_clears_registry() {
        // Port 9 (discard) is closed on test hosts; the call fails fast.
        let api = client();
        let result = api.request("/api/products", RequestOptions::default()).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(api.pending_count(), 0);
    }
}
