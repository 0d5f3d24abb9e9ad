//! Gateway error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised while talking to Discord.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Unexpected or undecodable gateway payloads
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// HTTP transport errors from the REST client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Still rate limited after the allowed number of retries
    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    /// Non-success REST response
    #[error("Discord API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl GatewayError {
    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
