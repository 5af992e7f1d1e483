//! Process configuration for the Toolhouse upstream.
//!
//! Credentials and the bundle identifier are read once at startup and held
//! immutable for the process lifetime; the config struct is moved into the
//! upstream client rather than stored globally.

use std::time::Duration;

use crate::error::{Result, ServerError};

/// Default Toolhouse API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.toolhouse.ai/v1";

/// Default bundle identifier when `TOOLHOUSE_BUNDLE` is unset.
pub const DEFAULT_BUNDLE: &str = "mcp-toolhouse";

/// Default bounded wait for tool invocation requests.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the Toolhouse upstream client.
#[derive(Debug, Clone)]
pub struct ToolhouseConfig {
    /// Bearer credential for the Toolhouse API.
    pub api_key: String,

    /// Bundle identifier supplied with every upstream call.
    pub bundle: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Timeout for discovery (`get_tools`) requests. `None` leaves the
    /// HTTP client's default in effect.
    pub list_timeout: Option<Duration>,

    /// Timeout for invocation (`run_tools`) requests.
    pub run_timeout: Duration,
}

impl ToolhouseConfig {
    /// Create a config with the given API key and default everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            bundle: DEFAULT_BUNDLE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            list_timeout: None,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Create config from the environment.
    ///
    /// `TOOLHOUSE_API_KEY` is required. `TOOLHOUSE_BUNDLE` defaults to
    /// `mcp-toolhouse` when unset but an empty value is rejected.
    /// `TOOLHOUSE_BASE_URL` optionally overrides the API endpoint.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TOOLHOUSE_API_KEY")
            .map_err(|_| ServerError::config("TOOLHOUSE_API_KEY environment variable is not set"))?;

        let mut config = Self::new(api_key);

        if let Ok(bundle) = std::env::var("TOOLHOUSE_BUNDLE") {
            config.bundle = bundle;
        }
        if let Ok(base_url) = std::env::var("TOOLHOUSE_BASE_URL") {
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the bundle identifier.
    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = bundle.into();
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the discovery request timeout.
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = Some(timeout);
        self
    }

    /// Set the invocation request timeout.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Reject empty credentials or bundle identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServerError::config(
                "TOOLHOUSE_API_KEY environment variable is not set",
            ));
        }
        if self.bundle.is_empty() {
            return Err(ServerError::config(
                "TOOLHOUSE_BUNDLE environment variable is not set",
            ));
        }
        Ok(())
    }
}
