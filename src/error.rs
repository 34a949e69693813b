//! Unified error handling for the steamcast crate
//!
//! Each module keeps its own error enum; [`Error`] wraps them all for code
//! that crosses module boundaries.
//!
//! # Architecture
//!
//! - [`DomainError`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust
//! use steamcast::error::{DomainError, Error, ErrorCategory};
//! use steamcast::utils::error::FetchError;
//!
//! let err = Error::from(FetchError::Timeout);
//! assert_eq!(err.category(), ErrorCategory::Network);
//! assert!(err.is_recoverable());
//! ```

use thiserror::Error;

use crate::notifications::format;

// Re-export domain-specific errors for convenience
pub use crate::commands::RequestError;
pub use crate::notifications::DeliveryError;
pub use crate::storage::LedgerError;
pub use crate::translation::TranslateError;
pub use crate::utils::error::FetchError;

/// Common trait for all steamcast error types
pub trait DomainError: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Upstream HTTP errors (feed, catalog, translation)
    Network,
    /// Ledger and filesystem errors
    Storage,
    /// Sink errors
    Delivery,
    /// Configuration and validation errors
    Config,
    /// On-demand request outcomes (cooldown, not found, no news)
    Request,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Delivery => "delivery",
            Self::Config => "config",
            Self::Request => "request",
        }
    }
}

impl DomainError for FetchError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl DomainError for TranslateError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Status(status) => crate::utils::error::is_retryable_status(*status),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Malformed(_) | Self::Unsupported => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl DomainError for LedgerError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl DomainError for DeliveryError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::Config,
            _ => ErrorCategory::Delivery,
        }
    }
}

impl DomainError for RequestError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::CooldownActive { .. } => true,
            Self::NotFound(_) | Self::NoNews(_) => false,
            Self::Delivery(e) => e.is_retryable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Delivery(_) => ErrorCategory::Delivery,
            _ => ErrorCategory::Request,
        }
    }
}

/// Unified error type for the steamcast crate
#[derive(Error, Debug)]
pub enum Error {
    /// Feed and catalog errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Translation backend errors
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    /// Ledger persistence errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Sink errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// On-demand request errors
    #[error("Request error: {0}")]
    Request(#[from] RequestError),
}

impl DomainError for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Translate(e) => e.is_recoverable(),
            Self::Ledger(e) => e.is_recoverable(),
            Self::Delivery(e) => e.is_recoverable(),
            Self::Request(e) => e.is_recoverable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Translate(e) => e.category(),
            Self::Ledger(e) => e.category(),
            Self::Delivery(e) => e.category(),
            Self::Request(e) => e.category(),
        }
    }
}

impl Error {
    /// Message safe to show to a chat user in `locale`
    ///
    /// Request outcomes get their own wording; everything else gets the
    /// generic notice so internal details never leak.
    pub fn user_notice(&self, locale: &str) -> String {
        match self {
            Self::Request(e) => e.notice(locale),
            _ => format::generic_error_notice(locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::from(FetchError::Timeout).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            Error::from(RequestError::NotFound("x".into())).category(),
            ErrorCategory::Request
        );
        assert_eq!(
            Error::from(DeliveryError::InvalidConfig("bad".into())).category(),
            ErrorCategory::Config
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::from(FetchError::ServerError(503)).is_recoverable());
        assert!(!Error::from(FetchError::Decode("x".into())).is_recoverable());
        assert!(Error::from(TranslateError::Timeout).is_recoverable());
        assert!(!Error::from(RequestError::NotFound("x".into())).is_recoverable());
    }

    #[test]
    fn test_user_notice_hides_details() {
        let err = Error::from(FetchError::Decode("unexpected token at line 3".into()));
        let notice = err.user_notice("fr");
        assert!(!notice.contains("token"));
        assert!(notice.starts_with("❌"));

        let cooldown = Error::from(RequestError::CooldownActive { remaining_secs: 5 });
        assert!(cooldown.user_notice("en").contains("5 seconds"));
    }

    #[test]
    fn test_request_notice_passes_through() {
        let outcome = RequestError::NotFound("Portal 3".into());
        let expected = outcome.notice("fr");
        assert_eq!(Error::from(outcome).user_notice("fr"), expected);
    }
}
