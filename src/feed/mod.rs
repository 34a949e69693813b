//! Steam news feed access
//!
//! - [`client`] - Steam Web API client (news, catalog lookup)
//! - [`sanitize`] - Tolerant markup stripping for titles and bodies
//! - [`image`] - Best-effort illustration image resolution

pub mod client;
pub mod image;
pub mod sanitize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::SteamFeedClient;

/// One upstream news item
///
/// Immutable once fetched. `id` is the source-assigned identifier and is
/// stable across fetches of the same feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Source identifier (Steam `gid`)
    pub id: String,

    /// Title with markup stripped
    pub title: String,

    /// Body with markup stripped
    pub body: String,

    /// Publish time, seconds since epoch
    pub published_at: i64,

    /// Author, when the source provides one
    pub author: Option<String>,

    /// Canonical article URL
    pub url: String,

    /// Illustration image, when one could be resolved
    pub image_url: Option<String>,

    /// Source label (e.g. "Community Announcements")
    pub feed_label: Option<String>,
}

/// A Steam app found through catalog lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRef {
    pub app_id: u32,
    pub name: String,
}

/// Source of articles for a tracked feed key
///
/// Implementations absorb transient failures: a failed fetch yields an
/// empty list so the caller's schedule keeps running.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch up to `max_count` recent articles, in source order
    async fn fetch_articles(&self, feed_key: &str, max_count: usize) -> Vec<Article>;
}

/// Name-based product lookup, used by the on-demand path
#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// Find the first app whose name matches `name`
    async fn search_app(&self, name: &str) -> Option<AppRef>;

    /// Conventional header image for an app, if it exists
    async fn header_image(&self, app_id: u32) -> Option<String>;
}
