//! steamcast - Steam news relay
//!
//! Polls the news feed of a Steam app, translates new articles and posts
//! them to a Discord channel, announcing each article once even across
//! restarts.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`feed`] - Steam Web API client, markup stripping, image resolution
//! - [`translation`] - Throttled translation gate and backends
//! - [`storage`] - Seen-item ledger
//! - [`notifications`] - Message layout and delivery sinks
//! - [`poller`] - One fetch/filter/translate/deliver/commit cycle
//! - [`scheduler`] - Fixed-interval driver that skips ticks while busy
//! - [`commands`] - On-demand news requests with per-requester cooldown
//! - [`status`] - Health and metrics endpoint
//! - [`metrics`] - Prometheus counters
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use steamcast::prelude::*;
//! use steamcast::translation::GoogleTranslator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let feed = Arc::new(SteamFeedClient::from_config(&config.feed)?);
//!     let backend = Arc::new(GoogleTranslator::new(
//!         &config.translation.endpoint,
//!         std::time::Duration::from_secs(config.translation.timeout_secs),
//!     )?);
//!     let gate = Arc::new(TranslationGate::from_config(backend, &config.translation));
//!     let sink = Arc::new(DiscordWebhookSink::from_config(&config.delivery)?);
//!
//!     let mut dispatcher = Dispatcher::new(
//!         TrackedTarget { feed_key: config.feed.app_id.clone(), destination: "discord".into() },
//!         DispatchSettings::from_config(&config),
//!         SeenLedger::load(&config.poller.ledger_path),
//!         feed,
//!         gate,
//!         sink,
//!     );
//!     let report = dispatcher.run_cycle().await;
//!     println!("delivered {}", report.delivered);
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod notifications;
pub mod poller;
pub mod scheduler;
pub mod status;
pub mod storage;
pub mod translation;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{NewsRequestHandler, RequestError};
    pub use crate::config::Config;
    pub use crate::error::{DomainError, Error, ErrorCategory};
    pub use crate::feed::{AppCatalog, Article, FeedSource, SteamFeedClient};
    pub use crate::notifications::{DeliveryMessage, DeliverySink, DiscordWebhookSink};
    pub use crate::poller::{CycleReport, DispatchSettings, Dispatcher, TrackedTarget};
    pub use crate::scheduler::{Scheduler, SchedulerReport};
    pub use crate::storage::SeenLedger;
    pub use crate::translation::{TranslationGate, Translator};
}

// Direct re-exports for convenience
pub use feed::Article;
