//! Error types for upstream HTTP access
//!
//! Shared by the feed client and the image resolver.

use thiserror::Error;

/// Errors that can occur while talking to the Steam Web API or CDN
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServerError(status) => is_retryable_status(*status),
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// Map a reqwest error, keeping timeouts distinct
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

/// Retry on 429 and the transient 5xx family; never on other 4xx.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_fetch_error_retryable() {
        assert!(FetchError::ServerError(502).is_retryable());
        assert!(!FetchError::ServerError(403).is_retryable());
        assert!(FetchError::Timeout.is_retryable());
        assert!(!FetchError::Decode("bad".into()).is_retryable());
    }
}
