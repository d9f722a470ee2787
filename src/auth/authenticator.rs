//! Authenticator implementation
//!
//! Applies the `Authorization` header to outgoing requests and holds the
//! credentials behind a lock so the user token can be installed after the
//! client has been built.

use super::types::Credentials;
use crate::error::{Error, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// JSON pointer of the user token in the `/auth` response
const USER_TOKEN_POINTER: &str = "/data/user_token";

/// Authenticator handles applying authentication to HTTP requests
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<RwLock<Credentials>>,
}

impl Authenticator {
    /// Create a new authenticator with the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(credentials)),
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, self.authorization().await)
    }

    /// Current `Authorization` header value
    pub async fn authorization(&self) -> String {
        self.credentials.read().await.authorization()
    }

    /// Install the user token, replacing any previous one
    pub async fn set_user_token(&self, user_token: impl Into<String>) {
        let mut creds = self.credentials.write().await;
        creds.user_token = Some(user_token.into());
        debug!("Authorization updated with user token");
    }

    /// Drop the user token, leaving partner-only authorization
    pub async fn clear_user_token(&self) {
        self.credentials.write().await.user_token = None;
    }

    /// Whether a user token is installed
    pub async fn has_user_token(&self) -> bool {
        self.credentials.read().await.user_token.is_some()
    }

    /// Pull the user token out of a decoded `/auth` response
    pub fn user_token_from_response(body: &Value) -> Result<String> {
        body.pointer(USER_TOKEN_POINTER)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                let reason = body
                    .pointer("/meta/message")
                    .and_then(Value::as_str)
                    .unwrap_or("no user_token in response");
                Error::auth(format!("User token exchange failed: {reason}"))
            })
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
