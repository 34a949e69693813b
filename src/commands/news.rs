//! On-demand "news for game X" requests
//!
//! Each request runs as its own task and shares the translation gate with
//! the poller. Requests never touch the seen-item ledger.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::cooldown::CooldownBook;
use crate::feed::{AppCatalog, AppRef, FeedSource};
use crate::notifications::format;
use crate::notifications::{deliver_with_fallback, DeliveryError, DeliverySink};
use crate::poller::{compose_message, DispatchSettings};
use crate::translation::TranslationGate;

/// Why an on-demand request produced no news
#[derive(Debug, Error)]
pub enum RequestError {
    /// The requester asked too recently
    #[error("Cooldown active, {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: u64 },

    /// No app matched the requested name
    #[error("No game found for {0:?}")]
    NotFound(String),

    /// The app has no recent news
    #[error("No recent news for {0:?}")]
    NoNews(String),

    /// Every article failed to reach the sink
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl RequestError {
    /// Human-readable notice in `lang`, without internal details
    pub fn notice(&self, lang: &str) -> String {
        match self {
            Self::CooldownActive { remaining_secs } => format::cooldown_notice(lang, *remaining_secs),
            Self::NotFound(name) => format::not_found_notice(lang, name),
            Self::NoNews(title) => format::no_news_notice(lang, title),
            Self::Delivery(_) => format::generic_error_notice(lang),
        }
    }
}

/// Outcome of one successful request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsReport {
    pub app: AppRef,
    pub delivered: usize,
    pub failed: usize,
}

/// Serves on-demand news requests
#[derive(Clone)]
pub struct NewsRequestHandler {
    catalog: Arc<dyn AppCatalog>,
    feed: Arc<dyn FeedSource>,
    gate: Arc<TranslationGate>,
    cooldowns: Arc<Mutex<CooldownBook>>,
    settings: DispatchSettings,
}

impl NewsRequestHandler {
    pub fn new(
        catalog: Arc<dyn AppCatalog>,
        feed: Arc<dyn FeedSource>,
        gate: Arc<TranslationGate>,
        settings: DispatchSettings,
        cooldown_secs: u64,
    ) -> Self {
        Self {
            catalog,
            feed,
            gate,
            cooldowns: Arc::new(Mutex::new(CooldownBook::new(cooldown_secs))),
            settings,
        }
    }

    /// Run a request as an independent task
    ///
    /// Awaiting the handle surfaces the result; dropping it detaches the
    /// task and errors are only logged.
    pub fn spawn(
        &self,
        requester: impl Into<String>,
        game_name: impl Into<String>,
        sink: Arc<dyn DeliverySink>,
    ) -> JoinHandle<Result<NewsReport, RequestError>> {
        let handler = self.clone();
        let requester = requester.into();
        let game_name = game_name.into();
        tokio::spawn(async move { handler.handle(&requester, &game_name, sink.as_ref()).await })
    }

    /// Run a request in the current task
    ///
    /// On error one localized notice is sent to `sink` before returning.
    pub async fn handle(
        &self,
        requester: &str,
        game_name: &str,
        sink: &dyn DeliverySink,
    ) -> Result<NewsReport, RequestError> {
        let result = self.process(requester, game_name, sink).await;

        if let Err(e) = &result {
            warn!(requester, game = %game_name, error = %e, "News request failed");
            let notice = e.notice(&self.settings.target_lang);
            if let Err(send_err) = sink.send_text(&notice).await {
                warn!(sink = sink.name(), error = %send_err, "Could not send failure notice");
            }
        }

        result
    }

    /// Seconds before `requester` may ask again
    pub fn cooldown_remaining(&self, requester: &str) -> u64 {
        let now = Utc::now();
        match self.cooldowns.lock() {
            Ok(book) => book.remaining(requester, now),
            Err(poisoned) => poisoned.into_inner().remaining(requester, now),
        }
    }

    async fn process(
        &self,
        requester: &str,
        game_name: &str,
        sink: &dyn DeliverySink,
    ) -> Result<NewsReport, RequestError> {
        let now = Utc::now();
        let allowed = match self.cooldowns.lock() {
            Ok(mut book) => book.check(requester, now),
            Err(poisoned) => poisoned.into_inner().check(requester, now),
        };
        allowed.map_err(|remaining_secs| RequestError::CooldownActive { remaining_secs })?;

        let app = self
            .catalog
            .search_app(game_name)
            .await
            .ok_or_else(|| RequestError::NotFound(game_name.to_string()))?;
        info!(requester, app_id = app.app_id, name = %app.name, "Game resolved");

        let articles = self
            .feed
            .fetch_articles(&app.app_id.to_string(), self.settings.max_items)
            .await;
        if articles.is_empty() {
            return Err(RequestError::NoNews(app.name));
        }

        let header_image = self.catalog.header_image(app.app_id).await;

        let mut delivered = 0;
        let mut failed = 0;
        let mut last_error = None;

        for (i, article) in articles.iter().enumerate() {
            if i > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }

            let message = compose_message(
                &self.gate,
                article,
                &self.settings,
                &app.name,
                header_image.as_deref(),
            )
            .await;

            match deliver_with_fallback(sink, &message).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(article_id = %article.id, error = %e, "On-demand delivery failed");
                    last_error = Some(e);
                }
            }
        }

        if delivered == 0 {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }

        info!(requester, app_id = app.app_id, delivered, failed, "News request complete");
        Ok(NewsReport {
            app,
            delivered,
            failed,
        })
    }
}
