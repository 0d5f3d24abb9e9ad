//! solved.ac client error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying solved.ac.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport level failure (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A 200 response whose body is not the expected JSON document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL cannot be turned into a request URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
