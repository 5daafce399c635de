//! Classification service configuration.
//!
//! Values come from the environment and can be overridden by the caller.
//! The API key is required; a missing key is reported when the config is
//! built so the application can refuse to start.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling temperature sent with every classification request.
pub const TEMPERATURE: f32 = 0.1;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Fallback environment variable for the API key.
pub const API_KEY_FALLBACK_VAR: &str = "API_KEY";

/// Environment variable overriding the model.
pub const MODEL_VAR: &str = "GUARDME_MODEL";

/// Environment variable overriding the endpoint.
pub const BASE_URL_VAR: &str = "GUARDME_BASE_URL";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_VAR: &str = "GUARDME_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key was supplied.
    #[error("missing API key: set GEMINI_API_KEY (or API_KEY)")]
    MissingApiKey,

    /// A value could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Settings for the classification client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Credential for the classification service.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Base URL of the REST endpoint, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a config with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Loads the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the config using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR)
            .or_else(|| non_blank(API_KEY_FALLBACK_VAR))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key)?;

        if let Some(model) = non_blank(MODEL_VAR) {
            config = config.with_model(model);
        }
        if let Some(url) = non_blank(BASE_URL_VAR) {
            config = config.with_base_url(url);
        }
        if let Some(secs) = non_blank(TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: TIMEOUT_VAR,
                value: secs.clone(),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the generateContent URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}
