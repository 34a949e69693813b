//! Discord webhook sink
//!
//! Messages are posted as a single embed; plain text goes in `content`.
//! Text is cut to Discord's documented limits before sending.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{DeliveryError, DeliveryMessage, DeliverySink};
use crate::config::DeliveryConfig;
use crate::utils::retry::{with_retry_if, RetryConfig};
use crate::utils::truncate_text;

const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;
const MAX_FIELD_NAME_CHARS: usize = 256;
const MAX_FIELD_VALUE_CHARS: usize = 1024;
const MAX_FOOTER_CHARS: usize = 2048;
const MAX_AUTHOR_CHARS: usize = 256;
const MAX_CONTENT_CHARS: usize = 2000;
const MAX_FIELDS: usize = 25;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    author: EmbedAuthor,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedAuthor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

impl WebhookPayload {
    fn embed(message: &DeliveryMessage) -> Self {
        let timestamp = (message.timestamp > 0)
            .then(|| chrono::DateTime::from_timestamp(message.timestamp, 0))
            .flatten()
            .map(|t| t.to_rfc3339());

        let embed = Embed {
            title: truncate_text(&message.title, MAX_TITLE_CHARS),
            description: truncate_text(&message.body, MAX_DESCRIPTION_CHARS),
            url: Some(message.source_url.clone()).filter(|u| !u.is_empty()),
            color: message.color,
            timestamp,
            author: EmbedAuthor {
                name: truncate_text(&message.product_name, MAX_AUTHOR_CHARS),
                icon_url: message.icon_url.clone(),
            },
            image: message.image_url.clone().map(|url| EmbedImage { url }),
            thumbnail: message.thumbnail_url.clone().map(|url| EmbedImage { url }),
            fields: message
                .fields
                .iter()
                .take(MAX_FIELDS)
                .map(|f| EmbedField {
                    name: truncate_text(&f.name, MAX_FIELD_NAME_CHARS),
                    value: truncate_text(&f.value, MAX_FIELD_VALUE_CHARS),
                    inline: f.inline,
                })
                .collect(),
            footer: EmbedFooter {
                text: truncate_text(&message.footer, MAX_FOOTER_CHARS),
                icon_url: message.icon_url.clone(),
            },
        };

        Self {
            content: None,
            embeds: vec![embed],
        }
    }

    fn text(text: &str) -> Self {
        Self {
            content: Some(truncate_text(text, MAX_CONTENT_CHARS)),
            embeds: Vec::new(),
        }
    }
}

/// Posts messages to one Discord webhook
///
/// # Example
///
/// ```rust,ignore
/// use steamcast::notifications::{DiscordWebhookSink, DeliverySink};
///
/// let sink = DiscordWebhookSink::new("https://discord.com/api/webhooks/1/abc", Duration::from_secs(10))?;
/// sink.send_text("hello").await?;
/// ```
pub struct DiscordWebhookSink {
    url: String,
    client: Client,
    retry: RetryConfig,
}

impl DiscordWebhookSink {
    /// Create a sink for `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DeliveryError::InvalidConfig(
                "Webhook URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url,
            client,
            retry: RetryConfig::new(3),
        })
    }

    /// Create a sink from the `[delivery]` configuration section
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        Ok(Self::new(&config.webhook_url, Duration::from_secs(config.timeout_secs))?
            .with_retry(RetryConfig::new(config.max_retries)))
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        with_retry_if(
            &self.retry,
            || self.post_once(payload),
            DeliveryError::is_retryable,
        )
        .await
    }

    async fn post_once(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(DeliveryError::from_request)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Webhook accepted message");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DeliverySink for DiscordWebhookSink {
    fn name(&self) -> &str {
        "discord"
    }

    async fn ready(&self) -> Result<(), DeliveryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(DeliveryError::from_request)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    async fn send_message(&self, message: &DeliveryMessage) -> Result<(), DeliveryError> {
        self.post(&WebhookPayload::embed(message)).await
    }

    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        self.post(&WebhookPayload::text(text)).await
    }
}
