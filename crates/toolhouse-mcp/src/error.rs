//! Error types for the Toolhouse MCP server.

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error type for server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Required configuration is missing or invalid at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to read or write on the protocol stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed inbound protocol data.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The outbound HTTP call could not complete.
    #[error("network error: {0}")]
    Network(String),

    /// The Toolhouse API returned a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code from the upstream response.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The bounded wait on an upstream call was exceeded.
    #[error("upstream request timed out")]
    Timeout,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an upstream status error.
    pub fn upstream_status(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServerError::Timeout
        } else if err.is_connect() {
            ServerError::Network(format!("connection failed: {}", err))
        } else {
            ServerError::Network(err.to_string())
        }
    }
}
