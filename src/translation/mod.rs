//! Throttled translation
//!
//! ```text
//! caller ──► TranslationGate ──► Throttle (window, spacing) ──► Translator backend
//!                 │                                                   │
//!                 └──────── "[Translation failed] <text>" ◄── error ──┘
//! ```
//!
//! The gate owns the throttle behind an async mutex and holds it for the
//! whole backend call, so calls are serialized even when the poller and
//! on-demand tasks share one gate.

pub mod google;
pub mod throttle;
pub mod truncate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::TranslationConfig;
use crate::metrics;
use crate::utils::take_chars;

pub use google::GoogleTranslator;
pub use throttle::Throttle;

/// Prefix applied to text whose translation failed
pub const FAILURE_MARKER: &str = "[Translation failed]";

/// Pause between items of a batch, on top of the throttle
const BATCH_ITEM_DELAY: Duration = Duration::from_millis(500);

/// Chars sent for language detection
const DETECT_SAMPLE_CHARS: usize = 100;

/// Errors raised by translation backends
#[derive(Error, Debug)]
pub enum TranslateError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Translation service returned status {0}")]
    Status(u16),

    /// Call exceeded the configured timeout
    #[error("Translation request timed out")]
    Timeout,

    /// Response did not have the expected shape
    #[error("Malformed translation response: {0}")]
    Malformed(String),

    /// Backend does not offer this operation
    #[error("Operation not supported by backend")]
    Unsupported,
}

/// A text-in/text-out translation capability
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;

    /// Detect the language of `text`
    async fn detect(&self, _text: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Unsupported)
    }
}

/// Serializing, throttling wrapper around a [`Translator`]
pub struct TranslationGate {
    backend: Arc<dyn Translator>,
    throttle: Mutex<Throttle>,
    max_length: usize,
    call_timeout: Duration,
}

impl TranslationGate {
    /// Create a gate
    ///
    /// * `max_per_minute` - call budget per rolling 60 second window
    /// * `min_spacing` - minimum time between consecutive calls
    /// * `max_length` - payload limit in chars
    /// * `call_timeout` - bound on each backend call
    pub fn new(
        backend: Arc<dyn Translator>,
        max_per_minute: usize,
        min_spacing: Duration,
        max_length: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            throttle: Mutex::new(Throttle::per_minute(max_per_minute, min_spacing)),
            max_length,
            call_timeout,
        }
    }

    /// Create a gate from the `[translation]` configuration section
    pub fn from_config(backend: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        Self::new(
            backend,
            config.max_per_minute,
            Duration::from_millis(config.min_interval_ms),
            config.max_length,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Translate `text`, degrading to the marked original on failure
    ///
    /// Blank input is returned unchanged without spending budget.
    pub async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let payload = truncate::prepare_text(text, self.max_length);

        let mut throttle = self.throttle.lock().await;
        let waited = throttle.acquire().await;
        metrics::record_throttle_wait(waited);

        let outcome = tokio::time::timeout(
            self.call_timeout,
            self.backend.translate(&payload, source_lang, target_lang),
        )
        .await
        .unwrap_or(Err(TranslateError::Timeout));
        drop(throttle);

        match outcome {
            Ok(translated) => {
                metrics::record_translation("ok");
                debug!(
                    chars = payload.chars().count(),
                    waited_ms = waited.as_millis() as u64,
                    "Translated text"
                );
                translated
            }
            Err(e) => {
                metrics::record_translation("failed");
                warn!(error = %e, source_lang, target_lang, "Translation failed, using original text");
                format!("{FAILURE_MARKER} {text}")
            }
        }
    }

    /// Translate several texts in order
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<String> {
        let mut results = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            results.push(self.translate(text, source_lang, target_lang).await);
            if i + 1 < texts.len() {
                tokio::time::sleep(BATCH_ITEM_DELAY).await;
            }
        }
        results
    }

    /// Detect the language of `text`, `None` when unknown
    pub async fn detect_language(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let sample = take_chars(text, DETECT_SAMPLE_CHARS);

        let mut throttle = self.throttle.lock().await;
        let waited = throttle.acquire().await;
        metrics::record_throttle_wait(waited);

        let outcome = tokio::time::timeout(self.call_timeout, self.backend.detect(&sample))
            .await
            .unwrap_or(Err(TranslateError::Timeout));
        drop(throttle);

        match outcome {
            Ok(lang) => Some(lang),
            Err(e) => {
                warn!(error = %e, "Language detection failed");
                None
            }
        }
    }
}
