//! Options structures for model and transport configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const ENV_BACKEND_URL: &str = "EIMEMES_BACKEND_URL";
pub const ENV_BACKEND_TOKEN: &str = "EIMEMES_BACKEND_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "EIMEMES_TIMEOUT_SECS";
pub const ENV_PROXY: &str = "EIMEMES_PROXY";

/// Bearer token holder whose `Debug` output never shows the value,
/// so options structs can be logged with `?` safely.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl From<String> for SecretString {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SecretString {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

/// Model behavior parameters sent with every chat request.
///
/// # Example
/// ```rust
/// use eimemes::options::ModelOptions;
///
/// let options = ModelOptions::default()
///     .with_model("mixtral-8x7b-32768".to_string())
///     .with_temperature(0.2);
/// assert_eq!(options.max_tokens, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelOptions {
    /// Model identifier as listed by the backend's `/chat/models`
    pub model: String,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ModelOptions {
    /// Set the model identifier.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// HTTP transport configuration for the chat backend.
///
/// # Example
/// ```rust
/// use eimemes::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("https://chat.example.com/api".to_string())
///     .with_token("id-token")
///     .with_timeout(Duration::from_secs(30));
/// assert!(options.token.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Base URL for backend endpoints, without the `/chat/...` suffix
    pub base_url: String,

    /// Bearer token issued by the identity provider
    pub token: Option<SecretString>,

    /// Request timeout
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    /// Create new transport options for the given backend.
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
            timeout: None,
            proxy: None,
            extra_headers: None,
        }
    }

    /// Load transport options from `EIMEMES_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup(ENV_BACKEND_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::Config(format!("{} is required", ENV_BACKEND_URL)))?;

        let mut options = Self::new(base_url);
        options.token = lookup(ENV_BACKEND_TOKEN).map(SecretString::new);
        options.proxy = lookup(ENV_PROXY);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            options.timeout = Some(Duration::from_secs(secs));
        }

        Ok(options)
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<SecretString>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
