//! Poll cycle: fetch, filter against the ledger, translate, deliver, commit
//!
//! ```text
//! Idle → Fetching → Filtering → ┬→ Translating → Delivering → Committing ┐
//!                               └──────────────── next new article ◄──────┘
//! ```
//!
//! Each id is committed right after its own delivery succeeds. A crash
//! between delivery and commit re-delivers only that article on restart.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::feed::{AppCatalog, Article, FeedSource};
use crate::metrics;
use crate::notifications::format::{self, MessageContext, TranslatedArticle};
use crate::notifications::{deliver_with_fallback, DeliveryMessage, DeliveryPath, DeliverySink};
use crate::storage::SeenLedger;
use crate::translation::TranslationGate;

/// Product name used when neither the settings nor the article name one
const FALLBACK_PRODUCT_NAME: &str = "Steam";

/// Where the poller is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollerState {
    WaitingForReady,
    Idle,
    Fetching,
    Filtering,
    Translating,
    Delivering,
    Committing,
}

/// The feed being followed and where its articles go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTarget {
    /// Steam app id, as a string
    pub feed_key: String,

    /// Sink destination, for logs
    pub destination: String,
}

/// Knobs of one dispatch pass
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub max_items: usize,
    pub body_excerpt_chars: usize,
    pub item_delay: Duration,
    pub source_lang: String,
    pub target_lang: String,
    pub product_name: Option<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_items: 3,
            body_excerpt_chars: 600,
            item_delay: Duration::from_secs(1),
            source_lang: "en".to_string(),
            target_lang: "fr".to_string(),
            product_name: None,
        }
    }
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_items: config.feed.max_items,
            body_excerpt_chars: config.poller.body_excerpt_chars,
            item_delay: config.poller.item_delay(),
            source_lang: config.translation.source_lang.clone(),
            target_lang: config.translation.target_lang.clone(),
            product_name: Some(config.feed.product_name.trim().to_string())
                .filter(|name| !name.is_empty()),
        }
    }
}

/// Counts for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub already_seen: usize,
    pub delivered: usize,
    pub failed: usize,
    pub ledger_errors: usize,
}

/// Translate the title and body excerpt of `article`
///
/// Title first, then the excerpt, both through the shared gate.
pub async fn translate_article(
    gate: &TranslationGate,
    article: &Article,
    settings: &DispatchSettings,
) -> TranslatedArticle {
    let title = gate
        .translate(&article.title, &settings.source_lang, &settings.target_lang)
        .await;
    let (excerpt, truncated) = format::body_excerpt(&article.body, settings.body_excerpt_chars);
    let body = gate
        .translate(&excerpt, &settings.source_lang, &settings.target_lang)
        .await;

    TranslatedArticle {
        title,
        body,
        truncated,
    }
}

/// Translate and lay out one article
pub async fn compose_message(
    gate: &TranslationGate,
    article: &Article,
    settings: &DispatchSettings,
    product_name: &str,
    header_image: Option<&str>,
) -> DeliveryMessage {
    let translated = translate_article(gate, article, settings).await;
    let ctx = MessageContext {
        product_name,
        header_image,
        lang: &settings.target_lang,
    };
    format::build_message(article, &translated, &ctx)
}

/// Runs poll cycles for one tracked target
///
/// The dispatcher owns the ledger and is its only writer.
pub struct Dispatcher {
    target: TrackedTarget,
    settings: DispatchSettings,
    ledger: SeenLedger,
    feed: Arc<dyn FeedSource>,
    catalog: Option<Arc<dyn AppCatalog>>,
    gate: Arc<TranslationGate>,
    sink: Arc<dyn DeliverySink>,
    state: PollerState,
}

impl Dispatcher {
    pub fn new(
        target: TrackedTarget,
        settings: DispatchSettings,
        ledger: SeenLedger,
        feed: Arc<dyn FeedSource>,
        gate: Arc<TranslationGate>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        Self {
            target,
            settings,
            ledger,
            feed,
            catalog: None,
            gate,
            sink,
            state: PollerState::Idle,
        }
    }

    /// Use `catalog` for the header image shown with each message
    pub fn with_catalog(mut self, catalog: Arc<dyn AppCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PollerState) {
        self.state = state;
    }

    pub fn ledger(&self) -> &SeenLedger {
        &self.ledger
    }

    pub fn target(&self) -> &TrackedTarget {
        &self.target
    }

    pub fn sink(&self) -> &Arc<dyn DeliverySink> {
        &self.sink
    }

    /// Give back the ledger, ending the dispatcher
    pub fn into_ledger(self) -> SeenLedger {
        self.ledger
    }

    /// Run one fetch/filter/translate/deliver/commit pass
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        self.state = PollerState::Fetching;
        let articles = self
            .feed
            .fetch_articles(&self.target.feed_key, self.settings.max_items)
            .await;
        report.fetched = articles.len();

        self.state = PollerState::Filtering;
        let (fresh, seen): (Vec<Article>, Vec<Article>) = articles
            .into_iter()
            .partition(|article| !self.ledger.is_seen(&article.id));
        report.already_seen = seen.len();

        if fresh.is_empty() {
            debug!(
                feed_key = %self.target.feed_key,
                fetched = report.fetched,
                "No new articles"
            );
            self.finish(report);
            return report;
        }

        info!(
            feed_key = %self.target.feed_key,
            new = fresh.len(),
            already_seen = report.already_seen,
            "New articles to deliver"
        );

        let header_image = self.header_image().await;

        for (i, article) in fresh.iter().enumerate() {
            if i > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }

            self.state = PollerState::Translating;
            let product_name = self.product_name(article);
            let message = compose_message(
                &self.gate,
                article,
                &self.settings,
                &product_name,
                header_image.as_deref(),
            )
            .await;

            self.state = PollerState::Delivering;
            match deliver_with_fallback(self.sink.as_ref(), &message).await {
                Ok(path) => {
                    report.delivered += 1;
                    info!(
                        article_id = %article.id,
                        destination = %self.target.destination,
                        plain_text = path == DeliveryPath::PlainText,
                        "Article delivered"
                    );

                    self.state = PollerState::Committing;
                    if let Err(e) = self.ledger.mark_seen(&article.id) {
                        report.ledger_errors += 1;
                        error!(
                            article_id = %article.id,
                            error = %e,
                            "Ledger write failed, continuing in memory"
                        );
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        article_id = %article.id,
                        sink = self.sink.name(),
                        error = %e,
                        "Delivery failed, article stays unseen"
                    );
                }
            }
        }

        self.finish(report);
        report
    }

    fn finish(&mut self, report: CycleReport) {
        self.state = PollerState::Idle;
        metrics::record_cycle(
            report.fetched,
            report.delivered,
            report.failed,
            report.ledger_errors,
        );
        info!(
            fetched = report.fetched,
            already_seen = report.already_seen,
            delivered = report.delivered,
            failed = report.failed,
            ledger_errors = report.ledger_errors,
            "Poll cycle complete"
        );
    }

    async fn header_image(&self) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        match self.target.feed_key.trim().parse::<u32>() {
            Ok(app_id) => catalog.header_image(app_id).await,
            Err(_) => {
                warn!(feed_key = %self.target.feed_key, "Feed key is not an app id, no header image");
                None
            }
        }
    }

    fn product_name(&self, article: &Article) -> String {
        self.settings
            .product_name
            .clone()
            .or_else(|| article.feed_label.clone())
            .unwrap_or_else(|| FALLBACK_PRODUCT_NAME.to_string())
    }
}
