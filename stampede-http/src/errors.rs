//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport failure raised by the mock transport in tests
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}
