//! Common test utilities: in-memory feed, translator and sink fakes

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use steamcast::feed::{AppCatalog, AppRef, Article, FeedSource};
use steamcast::notifications::{DeliveryError, DeliveryMessage, DeliverySink};
use steamcast::translation::{TranslateError, TranslationGate, Translator};

/// Create a test article with default values
pub fn create_test_article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        body: format!("Body of {title}. Bug fixes and balance changes."),
        published_at: 1_700_000_000,
        author: Some("Valve".to_string()),
        url: format!("https://store.steampowered.com/news/app/10/view/{id}"),
        image_url: None,
        feed_label: Some("Community Announcements".to_string()),
    }
}

/// Gate without pacing, for tests that do not exercise the throttle
pub fn fast_gate(backend: Arc<dyn Translator>) -> Arc<TranslationGate> {
    Arc::new(TranslationGate::new(
        backend,
        1_000,
        Duration::ZERO,
        1_500,
        Duration::from_secs(5),
    ))
}

// ============================================================================
// Feed
// ============================================================================

/// Feed returning a fixed, replaceable article list
///
/// Also acts as the catalog for the on-demand path.
#[derive(Default)]
pub struct StaticFeed {
    articles: Mutex<Vec<Article>>,
    apps: Vec<AppRef>,
    header: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticFeed {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            ..Default::default()
        }
    }

    /// Each fetch takes `delay` of (tokio) time
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_app(mut self, app_id: u32, name: &str) -> Self {
        self.apps.push(AppRef {
            app_id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_header(mut self, url: &str) -> Self {
        self.header = Some(url.to_string());
        self
    }

    pub fn set_articles(&self, articles: Vec<Article>) {
        *self.articles.lock().unwrap() = articles;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_articles(&self, _feed_key: &str, max_count: usize) -> Vec<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.articles
            .lock()
            .unwrap()
            .iter()
            .take(max_count)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AppCatalog for StaticFeed {
    async fn search_app(&self, name: &str) -> Option<AppRef> {
        let needle = name.to_lowercase();
        self.apps
            .iter()
            .find(|app| app.name.to_lowercase().contains(&needle))
            .cloned()
    }

    async fn header_image(&self, _app_id: u32) -> Option<String> {
        self.header.clone()
    }
}

// ============================================================================
// Translator
// ============================================================================

/// Translator that tags text with the target language and records call times
#[derive(Default)]
pub struct TaggingTranslator {
    calls: Mutex<Vec<Instant>>,
}

impl TaggingTranslator {
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push(Instant::now());
        Ok(format!("[{target_lang}] {text}"))
    }
}

/// Translator that always fails
pub struct BrokenTranslator;

#[async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Status(503))
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Sink that records what it accepts
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<DeliveryMessage>>,
    texts: Mutex<Vec<String>>,
    reject_structured: bool,
    reject_text: bool,
    reject_containing: Vec<String>,
    ready_failures: AtomicUsize,
    ready_calls: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structured messages are refused, plain text is accepted
    pub fn rejecting_structured() -> Self {
        Self {
            reject_structured: true,
            ..Default::default()
        }
    }

    /// Both paths are refused
    pub fn rejecting_everything() -> Self {
        Self {
            reject_structured: true,
            reject_text: true,
            ..Default::default()
        }
    }

    /// Both paths are refused for messages whose title contains `fragment`
    pub fn rejecting_titles_with(mut self, fragment: &str) -> Self {
        self.reject_containing.push(fragment.to_string());
        self
    }

    /// The first `count` readiness checks fail
    pub fn with_ready_failures(self, count: usize) -> Self {
        self.ready_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn messages(&self) -> Vec<DeliveryMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.title).collect()
    }

    pub fn ready_calls(&self) -> usize {
        self.ready_calls.load(Ordering::SeqCst)
    }

    fn refuses(&self, text: &str) -> bool {
        self.reject_containing
            .iter()
            .any(|fragment| text.contains(fragment.as_str()))
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn ready(&self) -> Result<(), DeliveryError> {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.ready_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.ready_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DeliveryError::Rejected("not connected".to_string()));
        }
        Ok(())
    }

    async fn send_message(&self, message: &DeliveryMessage) -> Result<(), DeliveryError> {
        if self.reject_structured || self.refuses(&message.title) {
            return Err(DeliveryError::Status {
                status: 400,
                body: "invalid embed".to_string(),
            });
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        if self.reject_text || self.refuses(text) {
            return Err(DeliveryError::Rejected("text refused".to_string()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
