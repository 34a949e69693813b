//! Configuration management for steamcast
//!
//! Configuration comes from a TOML file (`Config::from_file`) or from
//! `STEAMCAST_*` environment variables (`Config::from_env`). Every field has
//! a default except the tracked app id and the webhook URL. An environment
//! profile selected by `STEAMCAST_ENV` can then adjust a few knobs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::feed::client::{DEFAULT_API_BASE, DEFAULT_CDN_BASE, DEFAULT_STORE_BASE};
use crate::translation::google::DEFAULT_ENDPOINT;

/// Language codes accepted for source and target
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
];

/// Whether `code` is one of [`SUPPORTED_LANGUAGES`]
pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Steam feed configuration
    pub feed: FeedConfig,

    /// Translation gate configuration
    pub translation: TranslationConfig,

    /// Poll loop configuration
    pub poller: PollerConfig,

    /// Delivery sink configuration
    pub delivery: DeliveryConfig,

    /// On-demand command configuration
    pub commands: CommandsConfig,

    /// Status endpoint configuration
    pub status: StatusConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Steam feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Tracked Steam app id
    pub app_id: String,

    /// Display name of the tracked app; the article feed label when empty
    pub product_name: String,

    /// Steam Web API base URL
    pub api_base_url: String,

    /// Steam store base URL
    pub store_base_url: String,

    /// Steam CDN base URL
    pub cdn_base_url: String,

    /// Articles requested per fetch
    pub max_items: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// Retries for 429 and 5xx answers
    pub max_retries: u32,

    /// Fetch article pages when the body has no image
    pub scrape_article_pages: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            product_name: String::new(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            store_base_url: DEFAULT_STORE_BASE.to_string(),
            cdn_base_url: DEFAULT_CDN_BASE.to_string(),
            max_items: 3,
            request_timeout_secs: 30,
            requests_per_second: 2,
            max_retries: 2,
            scrape_article_pages: true,
        }
    }
}

/// Translation gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation endpoint
    pub endpoint: String,

    /// Language of the upstream articles
    pub source_lang: String,

    /// Language posted to the channel
    pub target_lang: String,

    /// Calls allowed per rolling minute
    pub max_per_minute: usize,

    /// Minimum spacing between calls in milliseconds
    pub min_interval_ms: u64,

    /// Longest payload sent, in chars
    pub max_length: usize,

    /// Bound on each call in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            source_lang: "en".to_string(),
            target_lang: "fr".to_string(),
            max_per_minute: 20,
            min_interval_ms: 1000,
            max_length: 1500,
            timeout_secs: 30,
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between ticks
    pub interval_secs: u64,

    /// Pause between deliveries in milliseconds
    pub item_delay_ms: u64,

    /// Body chars kept for the message excerpt
    pub body_excerpt_chars: usize,

    /// Seen-item ledger file
    pub ledger_path: PathBuf,

    /// Seconds between readiness checks at startup
    pub ready_retry_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            item_delay_ms: 1000,
            body_excerpt_chars: 600,
            ledger_path: PathBuf::from("data/seen_articles.json"),
            ready_retry_secs: 5,
        }
    }
}

impl PollerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    #[must_use]
    pub fn ready_retry(&self) -> Duration {
        Duration::from_secs(self.ready_retry_secs)
    }
}

/// Delivery sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Discord webhook URL (secret)
    pub webhook_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for 429 and 5xx answers
    pub max_retries: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

/// On-demand command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Seconds a requester waits between two requests
    pub cooldown_secs: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { cooldown_secs: 30 }
    }
}

/// Status endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Listen address (e.g. `127.0.0.1:9090`); disabled when unset
    pub listen_addr: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Deployment profile selected by `STEAMCAST_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Standard,
    Development,
    Production,
}

impl FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "standard" | "default" => Ok(Self::Standard),
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("Unknown environment profile: {other}"),
        }
    }
}

impl Profile {
    /// Read `STEAMCAST_ENV`; unset means [`Profile::Standard`]
    pub fn from_env() -> Result<Self> {
        match std::env::var("STEAMCAST_ENV") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::Standard),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let feed = FeedConfig {
            app_id: std::env::var("STEAMCAST_APP_ID").unwrap_or_default(),
            product_name: std::env::var("STEAMCAST_PRODUCT_NAME").unwrap_or_default(),
            api_base_url: std::env::var("STEAMCAST_API_BASE_URL")
                .unwrap_or(defaults.feed.api_base_url),
            store_base_url: std::env::var("STEAMCAST_STORE_BASE_URL")
                .unwrap_or(defaults.feed.store_base_url),
            cdn_base_url: std::env::var("STEAMCAST_CDN_BASE_URL")
                .unwrap_or(defaults.feed.cdn_base_url),
            max_items: env_or("STEAMCAST_MAX_ITEMS", defaults.feed.max_items),
            request_timeout_secs: env_or(
                "STEAMCAST_REQUEST_TIMEOUT",
                defaults.feed.request_timeout_secs,
            ),
            requests_per_second: env_or(
                "STEAMCAST_REQUESTS_PER_SECOND",
                defaults.feed.requests_per_second,
            ),
            max_retries: env_or("STEAMCAST_FEED_RETRIES", defaults.feed.max_retries),
            scrape_article_pages: env_bool(
                "STEAMCAST_SCRAPE_PAGES",
                defaults.feed.scrape_article_pages,
            ),
        };

        let translation = TranslationConfig {
            endpoint: std::env::var("STEAMCAST_TRANSLATE_ENDPOINT")
                .unwrap_or(defaults.translation.endpoint),
            source_lang: std::env::var("STEAMCAST_SOURCE_LANG")
                .unwrap_or(defaults.translation.source_lang),
            target_lang: std::env::var("STEAMCAST_TARGET_LANG")
                .unwrap_or(defaults.translation.target_lang),
            max_per_minute: env_or(
                "STEAMCAST_TRANSLATIONS_PER_MINUTE",
                defaults.translation.max_per_minute,
            ),
            min_interval_ms: env_or(
                "STEAMCAST_TRANSLATION_INTERVAL_MS",
                defaults.translation.min_interval_ms,
            ),
            max_length: env_or(
                "STEAMCAST_MAX_TRANSLATION_LENGTH",
                defaults.translation.max_length,
            ),
            timeout_secs: env_or(
                "STEAMCAST_TRANSLATION_TIMEOUT",
                defaults.translation.timeout_secs,
            ),
        };

        let poller = PollerConfig {
            interval_secs: env_or("STEAMCAST_POLL_INTERVAL", defaults.poller.interval_secs),
            item_delay_ms: env_or("STEAMCAST_ITEM_DELAY_MS", defaults.poller.item_delay_ms),
            body_excerpt_chars: env_or(
                "STEAMCAST_EXCERPT_CHARS",
                defaults.poller.body_excerpt_chars,
            ),
            ledger_path: std::env::var("STEAMCAST_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.poller.ledger_path),
            ready_retry_secs: env_or("STEAMCAST_READY_RETRY", defaults.poller.ready_retry_secs),
        };

        let webhook_url = std::env::var("STEAMCAST_WEBHOOK_URL")
            .or_else(|_| std::env::var("DISCORD_WEBHOOK_URL"))
            .unwrap_or_default();

        let delivery = DeliveryConfig {
            webhook_url,
            timeout_secs: env_or("STEAMCAST_DELIVERY_TIMEOUT", defaults.delivery.timeout_secs),
            max_retries: env_or("STEAMCAST_DELIVERY_RETRIES", defaults.delivery.max_retries),
        };

        let commands = CommandsConfig {
            cooldown_secs: env_or("STEAMCAST_COOLDOWN", defaults.commands.cooldown_secs),
        };

        let status = StatusConfig {
            listen_addr: std::env::var("STEAMCAST_STATUS_ADDR")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        };

        let logging = LoggingConfig {
            level: std::env::var("STEAMCAST_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("STEAMCAST_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            feed,
            translation,
            poller,
            delivery,
            commands,
            status,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply the overrides of a deployment profile
    pub fn apply_profile(&mut self, profile: Profile) {
        match profile {
            Profile::Standard => {}
            Profile::Development => {
                self.logging.level = "debug".to_string();
                self.commands.cooldown_secs = 10;
                self.feed.max_items = 2;
            }
            Profile::Production => {
                self.logging.level = "warn".to_string();
                self.commands.cooldown_secs = 60;
                self.translation.max_per_minute = 15;
            }
        }
    }

    /// Validate configuration values
    ///
    /// The webhook URL is only checked for its scheme here; use
    /// [`Config::require_webhook`] where a sink is needed.
    pub fn validate(&self) -> Result<()> {
        let app_id = self.feed.app_id.trim();
        if app_id.is_empty() {
            anyhow::bail!("feed.app_id is required");
        }
        if app_id.parse::<u32>().is_err() {
            anyhow::bail!("feed.app_id must be a numeric Steam app id, got {app_id:?}");
        }

        if self.feed.max_items == 0 {
            anyhow::bail!("feed.max_items must be greater than 0");
        }

        if self.poller.interval_secs == 0 {
            anyhow::bail!("poller.interval_secs must be greater than 0");
        }

        if self.translation.max_per_minute == 0 {
            anyhow::bail!("translation.max_per_minute must be greater than 0");
        }

        if self.translation.max_length < 10 {
            anyhow::bail!("translation.max_length must be at least 10");
        }

        for (key, lang) in [
            ("translation.source_lang", &self.translation.source_lang),
            ("translation.target_lang", &self.translation.target_lang),
        ] {
            if !is_supported_language(lang) {
                anyhow::bail!("{key} {lang:?} is not a supported language");
            }
        }

        if !self.delivery.webhook_url.is_empty() {
            Self::check_webhook(&self.delivery.webhook_url)?;
        }

        Ok(())
    }

    /// Webhook URL, failing when missing or not http(s)
    pub fn require_webhook(&self) -> Result<&str> {
        if self.delivery.webhook_url.trim().is_empty() {
            anyhow::bail!("delivery.webhook_url is required");
        }
        Self::check_webhook(&self.delivery.webhook_url)?;
        Ok(&self.delivery.webhook_url)
    }

    fn check_webhook(raw: &str) -> Result<()> {
        let url = url::Url::parse(raw).context("delivery.webhook_url is not a valid URL")?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("delivery.webhook_url must use http or https");
        }
        Ok(())
    }

    /// Copy safe to print: the webhook token is masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.delivery.webhook_url.is_empty() {
            copy.delivery.webhook_url = match url::Url::parse(&copy.delivery.webhook_url) {
                Ok(url) => format!("{}://{}/***", url.scheme(), url.host_str().unwrap_or("")),
                Err(_) => "***".to_string(),
            };
        }
        copy
    }

    /// Get feed request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.request_timeout_secs)
    }
}
