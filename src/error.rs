//! Error types for taskmirror

use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for taskmirror
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal at startup: missing credential, bad storage directory, bad config.
    /// Nothing retries a configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A listing call failed: network error, unexpected status, malformed
    /// response body, or an exhausted rate-limit retry budget. Aborts the
    /// current entity type's extraction; the next cycle starts fresh.
    #[error("request error: {0}")]
    Request(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}
