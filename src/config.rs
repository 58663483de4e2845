//! Client configuration.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via
//! its [`ClientConfigBuilder`] or read from the environment with
//! [`ClientConfig::from_env`]. The builder clamps numeric knobs into their
//! valid ranges and `build()` rejects configurations that cannot work
//! (empty API key, non-HTTP base URL).

use crate::error::ConvertorioError;
use std::fmt;
use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.convertorio.com";

/// Default maximum number of job-status fetches per conversion.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// Default delay between two job-status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default timeout applied to each individual HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "CONVERTORIO_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "CONVERTORIO_BASE_URL";

/// Configuration for a [`crate::Client`].
///
/// # Example
/// ```rust
/// use convertorio::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder("sk_live_123")
///     .max_attempts(60)
///     .poll_interval(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 60);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token sent on every API call. Required.
    pub api_key: String,

    /// API base URL. Default: `https://api.convertorio.com`.
    pub base_url: String,

    /// Maximum job-status fetches before giving up. Default: 120.
    ///
    /// Together with `poll_interval` this bounds how long a single
    /// conversion may block: 120 × 2 s = 4 minutes.
    pub max_attempts: u32,

    /// Delay between two job-status fetches. Default: 2 s.
    pub poll_interval: Duration,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn redact(key: &str) -> String {
    if key.is_empty() {
        return "<empty>".to_string();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{tail}")
}

impl ClientConfig {
    /// Create a new builder seeded with the given API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                ..Self::default()
            },
        }
    }

    /// Build a configuration from `CONVERTORIO_API_KEY` and the optional
    /// `CONVERTORIO_BASE_URL`.
    pub fn from_env() -> Result<Self, ConvertorioError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let mut builder = Self::builder(api_key);
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }

    /// Check the invariants `build()` enforces.
    ///
    /// Public fields can be edited after building, so [`crate::Client::new`]
    /// re-checks before constructing the HTTP transport.
    pub fn validate(&self) -> Result<(), ConvertorioError> {
        if self.api_key.trim().is_empty() {
            return Err(ConvertorioError::InvalidConfig(format!(
                "API key is required. Set {API_KEY_ENV} or pass it explicitly; \
                 get yours at https://convertorio.com/account"
            )));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConvertorioError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConvertorioError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertorioError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
