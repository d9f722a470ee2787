//! Auth credential types

use serde::{Deserialize, Serialize};

/// Tokens sent with every request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Partner token issued for the integration
    pub partner_token: String,
    /// User token from the login exchange, if any
    #[serde(default)]
    pub user_token: Option<String>,
}

impl Credentials {
    /// Create credentials with only a partner token
    pub fn new(partner_token: impl Into<String>) -> Self {
        Self {
            partner_token: partner_token.into(),
            user_token: None,
        }
    }

    /// Attach a user token
    #[must_use]
    pub fn with_user_token(mut self, user_token: impl Into<String>) -> Self {
        self.user_token = Some(user_token.into());
        self
    }

    /// Value of the `Authorization` header
    ///
    /// `Bearer <partner>` or `Bearer <partner>, User <user>`.
    pub fn authorization(&self) -> String {
        match &self.user_token {
            Some(user) => format!("Bearer {}, User {}", self.partner_token, user),
            None => format!("Bearer {}", self.partner_token),
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("partner_token", &"***")
            .field("has_user_token", &self.user_token.is_some())
            .finish()
    }
}
