//! Illustration image heuristics
//!
//! Pure helpers used by [`SteamFeedClient`](super::SteamFeedClient) to pick an
//! image for an article. Resolution order:
//!
//! 1. CDN image URLs embedded in the article body
//! 2. CDN images on the article's canonical page (`og:image`, then `<img>`)
//! 3. The app's conventional header image, probed for existence
//!
//! Nothing here fails: no match means "no image".

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Base URL that `{STEAM_CLAN_IMAGE}` placeholders expand to
pub const CLAN_IMAGE_BASE: &str = "https://clan.akamai.steamstatic.com/images";

const CLAN_IMAGE_PLACEHOLDER: &str = "{STEAM_CLAN_IMAGE}";

/// Substrings that mark an image as decoration rather than illustration
const EXCLUDED_MARKERS: &[&str] = &[
    "icon", "avatar", "thumb", "emoticon", "logo", "favicon", "badge",
];

static CDN_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://(?:(?:clan|cdn|shared|store)\.(?:akamai|cloudflare|fastly)\.steamstatic\.com|steamcdn-a\.akamaihd\.net)/[^\s"'<>\[\]]+?\.(?:png|jpe?g|gif|webp)"#,
    )
    .expect("Invalid CDN image regex")
});

static OG_IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"], meta[name="twitter:image"]"#)
        .expect("Invalid og:image selector")
});

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("Invalid img selector"));

/// Whether a URL looks like an icon, avatar, thumbnail or similar
pub fn is_excluded(url: &str) -> bool {
    let lower = url.to_lowercase();
    EXCLUDED_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Whether a URL points at a known Steam CDN image
pub fn is_cdn_image(url: &str) -> bool {
    CDN_IMAGE_REGEX
        .find(url)
        .is_some_and(|m| m.start() == 0 && m.end() == url.len())
}

/// Expand `{STEAM_CLAN_IMAGE}` placeholders to absolute URLs
pub fn expand_placeholders(text: &str) -> String {
    text.replace(CLAN_IMAGE_PLACEHOLDER, CLAN_IMAGE_BASE)
}

/// First usable CDN image URL found in raw article text
pub fn find_in_text(raw: &str) -> Option<String> {
    let expanded = expand_placeholders(raw);
    CDN_IMAGE_REGEX
        .find_iter(&expanded)
        .map(|m| m.as_str())
        .find(|url| !is_excluded(url))
        .map(str::to_string)
}

/// First usable CDN image on an HTML page
///
/// Open Graph / Twitter card images are preferred over inline `<img>` tags.
pub fn find_in_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let meta_images = document
        .select(&OG_IMAGE_SELECTOR)
        .filter_map(|el| el.value().attr("content"));

    let inline_images = document.select(&IMG_SELECTOR).flat_map(|el| {
        let value = el.value();
        [value.attr("src"), value.attr("data-src")]
            .into_iter()
            .flatten()
    });

    let found = meta_images
        .chain(inline_images)
        .map(|url| expand_placeholders(url.trim()))
        .find(|url| is_cdn_image(url) && !is_excluded(url));
    found
}

/// Conventional header image URL for an app
pub fn header_image_url(cdn_base: &str, app_id: u32) -> String {
    format!(
        "{}/steam/apps/{app_id}/header.jpg",
        cdn_base.trim_end_matches('/')
    )
}
