//! Steam Web API client with rate limiting and retry
//!
//! This client covers every upstream call the relay makes:
//! - `ISteamNews/GetNewsForApp/v2` for article lists
//! - `api/storesearch` and `ISteamApps/GetAppList/v2` for name lookup
//! - article pages and the CDN header image for illustration images
//!
//! All public operations absorb failures: they log and return an empty
//! list or `None`, never an error.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::USER_AGENT, Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use super::image;
use super::sanitize::clean_markup;
use super::{AppCatalog, AppRef, Article, FeedSource};
use crate::config::FeedConfig;
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Default Steam Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.steampowered.com";

/// Default Steam store base URL
pub const DEFAULT_STORE_BASE: &str = "https://store.steampowered.com";

/// Default Steam CDN base URL
pub const DEFAULT_CDN_BASE: &str = "https://cdn.akamai.steamstatic.com";

// ============================================================================
// Response records
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    appnews: AppNews,
}

#[derive(Debug, Default, Deserialize)]
struct AppNews {
    #[serde(default)]
    newsitems: Vec<RawNewsItem>,
}

/// One item of `GetNewsForApp`; every field is optional upstream
#[derive(Debug, Default, Deserialize)]
struct RawNewsItem {
    #[serde(default, deserialize_with = "lenient_string")]
    gid: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    contents: String,
    #[serde(default)]
    feedlabel: String,
    #[serde(default)]
    date: i64,
}

#[derive(Debug, Default, Deserialize)]
struct StoreSearchResponse {
    #[serde(default)]
    items: Vec<StoreSearchItem>,
}

#[derive(Debug, Deserialize)]
struct StoreSearchItem {
    id: u32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct AppListResponse {
    #[serde(default)]
    applist: AppList,
}

#[derive(Debug, Default, Deserialize)]
struct AppList {
    #[serde(default)]
    apps: Vec<AppListEntry>,
}

#[derive(Debug, Deserialize)]
struct AppListEntry {
    appid: u32,
    #[serde(default)]
    name: String,
}

/// Accept ids encoded as either JSON strings or numbers
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// ============================================================================
// Client
// ============================================================================

/// Steam news and catalog client
pub struct SteamFeedClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter shared by every upstream request
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Backoff policy for retryable statuses
    retry: RetryConfig,

    api_base_url: String,
    store_base_url: String,
    cdn_base_url: String,

    /// Whether to fetch article pages when the body has no image
    scrape_article_pages: bool,

    /// Header image probe results per app
    header_cache: Mutex<HashMap<u32, Option<String>>>,
}

impl SteamFeedClient {
    /// Create a client against the public Steam endpoints
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(requests_per_second: u32, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            retry: RetryConfig::new(2),
            api_base_url: DEFAULT_API_BASE.to_string(),
            store_base_url: DEFAULT_STORE_BASE.to_string(),
            cdn_base_url: DEFAULT_CDN_BASE.to_string(),
            scrape_article_pages: true,
            header_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Create a client from the `[feed]` configuration section
    pub fn from_config(config: &FeedConfig) -> Result<Self, FetchError> {
        let client = Self::new(
            config.requests_per_second,
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_base_urls(
            &config.api_base_url,
            &config.store_base_url,
            &config.cdn_base_url,
        )
        .with_retry(RetryConfig::new(config.max_retries))
        .with_page_scraping(config.scrape_article_pages);

        Ok(client)
    }

    /// Override the upstream base URLs (used against mock servers)
    pub fn with_base_urls(mut self, api: &str, store: &str, cdn: &str) -> Self {
        self.api_base_url = api.trim_end_matches('/').to_string();
        self.store_base_url = store.trim_end_matches('/').to_string();
        self.cdn_base_url = cdn.trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable fetching article pages for images
    pub fn with_page_scraping(mut self, enabled: bool) -> Self {
        self.scrape_article_pages = enabled;
        self
    }

    /// Fetch and normalize news for an app
    ///
    /// # Errors
    ///
    /// Returns the last `FetchError` once retries are exhausted
    pub async fn try_fetch_articles(
        &self,
        app_id: u32,
        max_count: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let url = format!("{}/ISteamNews/GetNewsForApp/v2/", self.api_base_url);
        let count = max_count.to_string();
        let app = app_id.to_string();
        let query = [
            ("appid", app.as_str()),
            ("count", count.as_str()),
            ("maxlength", "0"),
            ("format", "json"),
        ];

        let response: NewsResponse = self.get_json(&url, &query).await?;

        let mut articles = Vec::with_capacity(response.appnews.newsitems.len());
        for raw in response.appnews.newsitems.into_iter().take(max_count) {
            if raw.gid.trim().is_empty() {
                debug!(app_id, title = %raw.title, "Dropping news item without gid");
                continue;
            }

            let image_url = self.resolve_image(&raw.contents, &raw.url, app_id).await;
            articles.push(Article {
                id: raw.gid,
                title: clean_markup(&raw.title),
                body: clean_markup(&raw.contents),
                published_at: raw.date,
                author: Some(raw.author.trim().to_string()).filter(|a| !a.is_empty()),
                url: raw.url,
                image_url,
                feed_label: Some(raw.feedlabel).filter(|l| !l.is_empty()),
            });
        }

        Ok(articles)
    }

    /// Resolve an illustration image for an article; never fails
    pub async fn resolve_image(&self, raw_body: &str, page_url: &str, app_id: u32) -> Option<String> {
        if let Some(found) = image::find_in_text(raw_body) {
            return Some(found);
        }

        if self.scrape_article_pages && !page_url.is_empty() {
            match self.fetch_page(page_url).await {
                Ok(html) => {
                    if let Some(found) = image::find_in_html(&html) {
                        return Some(found);
                    }
                }
                Err(e) => {
                    debug!(url = %page_url, error = %e, "Article page fetch failed");
                }
            }
        }

        self.header_image(app_id).await
    }

    async fn fetch_page(&self, page_url: &str) -> Result<String, FetchError> {
        let url = Url::parse(page_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(page_url.to_string()));
        }

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_request)
    }

    /// Probe whether a URL exists with a HEAD request
    async fn probe(&self, url: &str) -> bool {
        self.rate_limiter.until_ready().await;
        match self
            .client
            .request(Method::HEAD, url)
            .header(USER_AGENT, user_agent())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Image probe failed");
                false
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        with_retry_if(
            &self.retry,
            || self.get_json_once(url, query),
            FetchError::is_retryable,
        )
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .query(query)
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(FetchError::from_request)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn store_search(&self, name: &str) -> Result<Option<AppRef>, FetchError> {
        let url = format!("{}/api/storesearch/", self.store_base_url);
        let response: StoreSearchResponse = self
            .get_json(&url, &[("term", name), ("l", "english"), ("cc", "US")])
            .await?;

        Ok(response.items.into_iter().next().map(|item| AppRef {
            app_id: item.id,
            name: item.name,
        }))
    }

    async fn app_list_search(&self, name: &str) -> Result<Option<AppRef>, FetchError> {
        let url = format!("{}/ISteamApps/GetAppList/v2/", self.api_base_url);
        let response: AppListResponse = self.get_json(&url, &[]).await?;

        let needle = name.to_lowercase();
        Ok(response
            .applist
            .apps
            .into_iter()
            .find(|app| app.name.to_lowercase().contains(&needle))
            .map(|app| AppRef {
                app_id: app.appid,
                name: app.name,
            }))
    }
}

fn user_agent() -> String {
    format!("steamcast/{}", env!("CARGO_PKG_VERSION"))
}

#[async_trait]
impl FeedSource for SteamFeedClient {
    async fn fetch_articles(&self, feed_key: &str, max_count: usize) -> Vec<Article> {
        let app_id = match feed_key.trim().parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                warn!(feed_key = %feed_key, "Feed key is not a Steam app id");
                return Vec::new();
            }
        };

        match self.try_fetch_articles(app_id, max_count).await {
            Ok(articles) => {
                debug!(app_id, count = articles.len(), "Fetched news items");
                articles
            }
            Err(e) => {
                warn!(app_id, error = %e, "News fetch failed, treating as empty");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl AppCatalog for SteamFeedClient {
    async fn search_app(&self, name: &str) -> Option<AppRef> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        match self.store_search(name).await {
            Ok(Some(found)) => return Some(found),
            Ok(None) => debug!(name = %name, "Store search returned no items"),
            Err(e) => warn!(name = %name, error = %e, "Store search failed"),
        }

        match self.app_list_search(name).await {
            Ok(found) => found,
            Err(e) => {
                warn!(name = %name, error = %e, "App list search failed");
                None
            }
        }
    }

    async fn header_image(&self, app_id: u32) -> Option<String> {
        if let Ok(cache) = self.header_cache.lock() {
            if let Some(cached) = cache.get(&app_id) {
                return cached.clone();
            }
        }

        let url = image::header_image_url(&self.cdn_base_url, app_id);
        let resolved = self.probe(&url).await.then_some(url);

        if let Ok(mut cache) = self.header_cache.lock() {
            cache.insert(app_id, resolved.clone());
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_response_defaults_missing_fields() {
        let json = r#"{"appnews":{"appid":10,"newsitems":[{"gid":"123","title":"Hi"}]}}"#;
        let parsed: NewsResponse = serde_json::from_str(json).unwrap();
        let item = &parsed.appnews.newsitems[0];
        assert_eq!(item.gid, "123");
        assert_eq!(item.date, 0);
        assert!(item.contents.is_empty());
    }

    #[test]
    fn test_news_response_numeric_gid() {
        let json = r#"{"appnews":{"newsitems":[{"gid":5127,"date":1700000000}]}}"#;
        let parsed: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.appnews.newsitems[0].gid, "5127");
    }

    #[test]
    fn test_empty_payload_is_empty_list() {
        let parsed: NewsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.appnews.newsitems.is_empty());
    }

    #[test]
    fn test_client_creation_with_zero_rate() {
        let client = SteamFeedClient::new(0, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let client = SteamFeedClient::new(10, Duration::from_secs(5))
            .unwrap()
            .with_base_urls("http://a/", "http://b/", "http://c/");
        assert_eq!(client.api_base_url, "http://a");
        assert_eq!(client.store_base_url, "http://b");
        assert_eq!(client.cdn_base_url, "http://c");
    }
}
