//! HTTP transport and connection contexts
//!
//! Provides the single-request transport used by every endpoint:
//! - Default headers and `Authorization` applied to each request
//! - Optional rate limiting shared by all requests of one client
//! - JSON response decoding with transport/decode error classification
//!
//! A [`ConnectionContext`] owns a pooled `reqwest::Client`. One-shot calls
//! open and drop their own; paginated and batch fetches reuse one context
//! for all of their pages.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::Client;
use serde_json::Value;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Media type the API expects in `Accept`
pub const ACCEPT_V2: &str = "application/vnd.yclients.v2+json";

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests, in send order
    pub default_headers: Vec<(String, String)>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: vec![
                ("Accept".to_string(), ACCEPT_V2.to_string()),
                ("Accept-Language".to_string(), "ru-RU".to_string()),
                ("Cache-Control".to_string(), "no-cache".to_string()),
            ],
            user_agent: format!("yclients-api/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Look up a default header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.default_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set the `Accept-Language` locale (e.g. `ru-RU`, `en-US`)
    pub fn language(self, language: impl Into<String>) -> Self {
        self.header("Accept-Language", language)
    }

    /// Set a default header, replacing an existing one with the same name
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .config
            .default_headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(existing) => existing.1 = value,
            None => self.config.default_headers.push((key, value)),
        }
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters; repeated keys are sent as repeated pairs
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Request body (JSON, POST only)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter when a value is present
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Connection Context
// ============================================================================

/// A set of open transport resources (connection pool)
///
/// Contexts are cheap to share by reference across sequential fetches and
/// are released when dropped. A context must only be driven from one call
/// site at a time.
pub struct ConnectionContext {
    id: u64,
    client: Client,
    requests: AtomicU64,
}

impl ConnectionContext {
    /// Open a new context using the timeout and user agent of `config`
    pub fn open(config: &HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(context = id, "Connection context opened");
        Ok(Self {
            id,
            client,
            requests: AtomicU64::new(0),
        })
    }

    /// Process-unique context id (for logs)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of requests sent through this context
    pub fn requests_sent(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    fn client(&self) -> &Client {
        &self.client
    }
}

impl Drop for ConnectionContext {
    fn drop(&mut self) {
        debug!(
            context = self.id,
            requests = self.requests_sent(),
            "Connection context released"
        );
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("id", &self.id)
            .field("requests", &self.requests_sent())
            .finish_non_exhaustive()
    }
}

/// Either a caller-owned context or one owned by the current call
///
/// An owned context is released when the scope is dropped, on success and
/// on error alike. A shared one is left to its owner.
#[derive(Debug)]
pub enum ContextScope<'a> {
    /// Borrowed from the caller
    Shared(&'a ConnectionContext),
    /// Opened for, and released with, this scope
    Owned(ConnectionContext),
}

impl ContextScope<'_> {
    /// Whether this scope opened (and will release) its context
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl Deref for ContextScope<'_> {
    type Target = ConnectionContext;

    fn deref(&self) -> &ConnectionContext {
        match self {
            Self::Shared(ctx) => ctx,
            Self::Owned(ctx) => ctx,
        }
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// Authenticated JSON transport
pub struct HttpClient {
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: HttpClientConfig, authenticator: Authenticator) -> Self {
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        Self {
            config,
            authenticator,
            rate_limiter,
        }
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Authenticator applied to every request
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Open a new connection context
    pub fn open_context(&self) -> Result<ConnectionContext> {
        ConnectionContext::open(&self.config)
    }

    /// Use `shared` if given, otherwise open a context owned by the scope
    pub fn scope<'a>(&self, shared: Option<&'a ConnectionContext>) -> Result<ContextScope<'a>> {
        match shared {
            Some(ctx) => Ok(ContextScope::Shared(ctx)),
            None => Ok(ContextScope::Owned(self.open_context()?)),
        }
    }

    /// Perform one request through `context` and decode the JSON body
    pub async fn execute(
        &self,
        context: &ConnectionContext,
        method: Method,
        url: &str,
        request: RequestConfig,
    ) -> Result<Value> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let mut req = context.client().request(method.into(), url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            if method == Method::POST {
                req = req.json(body);
            } else {
                warn!("Ignoring JSON body on {} {}", method, url);
            }
        }

        req = req.timeout(timeout);
        req = self.authenticator.apply(req).await;

        let started = Instant::now();
        context.requests.fetch_add(1, Ordering::Relaxed);

        let response = req.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| classify(e, timeout))?;

        debug!(
            context = context.id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} {}",
            method,
            url
        );
        if !status.is_success() {
            warn!("{} {} returned HTTP {}", method, url, status.as_u16());
        }

        decode_body(status.as_u16(), &text)
    }

    /// Perform one request through a context opened just for it
    pub async fn execute_once(
        &self,
        method: Method,
        url: &str,
        request: RequestConfig,
    ) -> Result<Value> {
        let context = self.open_context()?;
        self.execute(&context, method, url, request).await
    }

    /// One-shot GET
    pub async fn get_json(&self, url: &str, request: RequestConfig) -> Result<Value> {
        self.execute_once(Method::GET, url, request).await
    }

    /// One-shot POST
    pub async fn post_json(&self, url: &str, request: RequestConfig) -> Result<Value> {
        self.execute_once(Method::POST, url, request).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a reqwest failure to a transport error
fn classify(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        Error::Transport(error)
    }
}

/// Decode a response body as JSON
fn decode_body(status: u16, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        Error::decode(format!(
            "HTTP {status} body is not valid JSON ({e}): {preview}"
        ))
    })
}
