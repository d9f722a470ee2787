//! Client configuration
//!
//! `ApiConfig` can be built in code, loaded from a YAML (or JSON) file, or
//! read from `YCLIENTS_*` environment variables.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::output::ColumnPolicy;
use crate::pagination::{FetchMode, PageCountPolicy, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the partner token
pub const ENV_TOKEN: &str = "YCLIENTS_TOKEN";
/// Environment variable holding the company id
pub const ENV_COMPANY_ID: &str = "YCLIENTS_COMPANY_ID";
/// Environment variable holding the booking form id
pub const ENV_FORM_ID: &str = "YCLIENTS_FORM_ID";
/// Environment variable holding a user token
pub const ENV_USER_TOKEN: &str = "YCLIENTS_USER_TOKEN";
/// Environment variable holding the locale
pub const ENV_LANGUAGE: &str = "YCLIENTS_LANGUAGE";

const DEFAULT_API_URL: &str = "https://api.yclients.com/api/v1";

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Partner (bearer) token
    pub token: String,

    /// Company (salon) id
    pub company_id: u64,

    /// Online-booking form id
    pub form_id: u64,

    /// `Accept-Language` locale
    #[serde(default = "default_language")]
    pub language: String,

    /// User token, if already known
    #[serde(default)]
    pub user_token: Option<String>,

    /// Base URL of account endpoints (clients, records, auth)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of booking-form endpoints; derived from `form_id` if unset
    #[serde(default)]
    pub form_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default page size for list endpoints
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Page-count formula
    #[serde(default)]
    pub page_count_policy: PageCountPolicy,

    /// Page fetch mode
    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// Column policy for tabular export
    #[serde(default)]
    pub column_policy: ColumnPolicy,

    /// Client-side rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_language() -> String {
    "ru-RU".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_per_page() -> u32 {
    MAX_PAGE_SIZE
}

impl ApiConfig {
    /// Config with defaults for everything but the identifiers
    pub fn new(token: impl Into<String>, company_id: u64, form_id: u64) -> Self {
        Self {
            token: token.into(),
            company_id,
            form_id,
            language: default_language(),
            user_token: None,
            api_url: default_api_url(),
            form_url: None,
            timeout_secs: default_timeout_secs(),
            per_page: default_per_page(),
            page_count_policy: PageCountPolicy::default(),
            fetch_mode: FetchMode::default(),
            column_policy: ColumnPolicy::default(),
            rate_limit: None,
        }
    }

    /// Create a config builder
    pub fn builder(token: impl Into<String>, company_id: u64, form_id: u64) -> ApiConfigBuilder {
        ApiConfigBuilder {
            config: Self::new(token, company_id, form_id),
        }
    }

    /// Parse a YAML (or JSON) document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML (or JSON) file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Read from `YCLIENTS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(ENV_TOKEN).ok_or_else(|| Error::missing_field(ENV_TOKEN))?;
        let company_id = parse_id(&lookup, ENV_COMPANY_ID)?;
        let form_id = parse_id(&lookup, ENV_FORM_ID)?;

        let mut config = Self::new(token, company_id, form_id);
        config.user_token = lookup(ENV_USER_TOKEN).filter(|t| !t.is_empty());
        if let Some(language) = lookup(ENV_LANGUAGE) {
            config.language = language;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check required values
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::missing_field("token"));
        }
        if self.per_page == 0 {
            return Err(Error::invalid_value("per_page", "must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be positive"));
        }
        if let FetchMode::Concurrent { limit: 0 } = self.fetch_mode {
            return Err(Error::invalid_value("fetch_mode.limit", "must be positive"));
        }
        url::Url::parse(&self.api_url)?;
        url::Url::parse(&self.form_base_url())?;
        Ok(())
    }

    /// Base URL of booking-form endpoints
    pub fn form_base_url(&self) -> String {
        self.form_url
            .clone()
            .unwrap_or_else(|| format!("https://n{}.yclients.com/api/v1", self.form_id))
    }

    /// Credentials to authorize requests with
    pub fn credentials(&self) -> Credentials {
        let creds = Credentials::new(&self.token);
        match &self.user_token {
            Some(user) => creds.with_user_token(user),
            None => creds,
        }
    }

    /// Transport settings derived from this config
    pub fn http_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .language(&self.language);
        match &self.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()).build(),
            None => builder.no_rate_limit().build(),
        }
    }
}

fn parse_id(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<u64> {
    let raw = lookup(key).ok_or_else(|| Error::missing_field(key))?;
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_value(key, format!("expected a numeric id, got '{raw}'")))
}

/// Builder for [`ApiConfig`]
#[derive(Debug, Clone)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    /// Set the locale
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Set a user token
    pub fn user_token(mut self, token: impl Into<String>) -> Self {
        self.config.user_token = Some(token.into());
        self
    }

    /// Override the account API base URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Override the booking-form base URL
    pub fn form_url(mut self, url: impl Into<String>) -> Self {
        self.config.form_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the default page size
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.config.per_page = per_page;
        self
    }

    /// Set the page-count policy
    pub fn page_count_policy(mut self, policy: PageCountPolicy) -> Self {
        self.config.page_count_policy = policy;
        self
    }

    /// Set the fetch mode
    pub fn fetch_mode(mut self, mode: FetchMode) -> Self {
        self.config.fetch_mode = mode;
        self
    }

    /// Set the tabular column policy
    pub fn column_policy(mut self, policy: ColumnPolicy) -> Self {
        self.config.column_policy = policy;
        self
    }

    /// Enable client-side rate limiting
    pub fn rate_limit(mut self, limit: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(limit);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ApiConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
