//! Delivery of formatted articles to a chat channel
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────┐
//! │  format::build_message        │  article + translation → DeliveryMessage
//! └───────────────────────────────┘
//!                 │
//!                 ▼
//! ┌───────────────────────────────┐
//! │  deliver_with_fallback        │  structured first, plain text second
//! └───────────────────────────────┘
//!                 │
//!                 ▼
//! ┌───────────────────────────────┐
//! │  dyn DeliverySink             │  DiscordWebhookSink in production
//! └───────────────────────────────┘
//! ```

pub mod discord;
pub mod format;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use discord::DiscordWebhookSink;

/// Errors that can occur while delivering a message
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out
    #[error("Delivery timed out")]
    Timeout,

    /// Sink answered with a non-success status
    #[error("Sink returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid sink configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sink refused the message for another reason
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

impl DeliveryError {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => crate::utils::error::is_retryable_status(*status),
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::InvalidConfig(_) | Self::Rejected(_) => false,
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

/// A labelled value shown under the message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl DeliveryField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// One formatted article, ready for a sink
///
/// `plain_text` is the rendering used when the structured form is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMessage {
    /// Translated title
    pub title: String,

    /// Translated excerpt
    pub body: String,

    /// Link to the article
    pub source_url: String,

    /// Publish time, seconds since epoch (0 when unknown)
    pub timestamp: i64,

    /// Product the article is about, shown as the message author line
    pub product_name: String,

    /// Article author
    pub author: Option<String>,

    /// Untranslated title
    pub original_title: Option<String>,

    /// Main image
    pub image_url: Option<String>,

    /// Small corner image
    pub thumbnail_url: Option<String>,

    /// Icon shown next to the author line and footer
    pub icon_url: Option<String>,

    /// Extra labelled values
    pub fields: Vec<DeliveryField>,

    /// Footer line
    pub footer: String,

    /// Accent color (RGB)
    pub color: u32,

    /// Fallback rendering
    pub plain_text: String,
}

/// A messaging surface that receives formatted articles
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Get the sink name
    fn name(&self) -> &str;

    /// Check that the sink can accept messages
    async fn ready(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Send a structured message
    async fn send_message(&self, message: &DeliveryMessage) -> Result<(), DeliveryError>;

    /// Send plain text
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Which rendering reached the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    Structured,
    PlainText,
}

/// Send `message`, falling back to its plain-text rendering
///
/// Returns the last error when both attempts fail.
pub async fn deliver_with_fallback(
    sink: &dyn DeliverySink,
    message: &DeliveryMessage,
) -> Result<DeliveryPath, DeliveryError> {
    match sink.send_message(message).await {
        Ok(()) => Ok(DeliveryPath::Structured),
        Err(e) => {
            tracing::warn!(
                sink = sink.name(),
                error = %e,
                "Structured delivery failed, sending plain text"
            );
            sink.send_text(&message.plain_text).await?;
            Ok(DeliveryPath::PlainText)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct PickySink {
        accept_structured: bool,
        accept_text: bool,
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliverySink for PickySink {
        fn name(&self) -> &str {
            "picky"
        }

        async fn send_message(&self, _message: &DeliveryMessage) -> Result<(), DeliveryError> {
            if self.accept_structured {
                Ok(())
            } else {
                Err(DeliveryError::Rejected("embed".into()))
            }
        }

        async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
            if self.accept_text {
                self.texts.lock().unwrap().push(text.to_string());
                Ok(())
            } else {
                Err(DeliveryError::Rejected("text".into()))
            }
        }
    }

    fn message() -> DeliveryMessage {
        DeliveryMessage {
            title: "Titre".into(),
            body: "Corps".into(),
            source_url: "https://example.com/42".into(),
            timestamp: 0,
            product_name: "Game".into(),
            author: None,
            original_title: None,
            image_url: None,
            thumbnail_url: None,
            icon_url: None,
            fields: Vec::new(),
            footer: String::new(),
            color: 0,
            plain_text: "**Titre**".into(),
        }
    }

    fn sink(accept_structured: bool, accept_text: bool) -> PickySink {
        PickySink {
            accept_structured,
            accept_text,
            texts: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_structured_first() {
        let s = sink(true, true);
        assert_eq!(
            deliver_with_fallback(&s, &message()).await.unwrap(),
            DeliveryPath::Structured
        );
        assert!(s.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_plain_text() {
        let s = sink(false, true);
        assert_eq!(
            deliver_with_fallback(&s, &message()).await.unwrap(),
            DeliveryPath::PlainText
        );
        assert_eq!(s.texts.lock().unwrap().as_slice(), ["**Titre**"]);
    }

    #[tokio::test]
    async fn test_both_fail() {
        assert!(deliver_with_fallback(&sink(false, false), &message()).await.is_err());
    }

    #[test]
    fn test_retryable_errors() {
        let rate_limited = DeliveryError::Status {
            status: 429,
            body: String::new(),
        };
        assert!(rate_limited.is_retryable());
        assert!(!DeliveryError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!DeliveryError::Rejected("x".into()).is_retryable());
    }
}
