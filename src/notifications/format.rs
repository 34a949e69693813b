//! Message layout and localized labels
//!
//! Labels exist in French and English; any other target language uses the
//! English set.

use crate::feed::Article;
use crate::utils::{char_len, take_chars};

use super::{DeliveryField, DeliveryMessage};

/// Steam dark blue
pub const STEAM_COLOR: u32 = 0x1b2838;

/// Icon used for the author line and footer
pub const STEAM_ICON_URL: &str =
    "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/steamworks_docs/english/steam_icon.png";

/// Original titles shorter than this are not repeated
const ORIGINAL_TITLE_MIN_CHARS: usize = 10;

/// Original titles are cut at this length
const ORIGINAL_TITLE_MAX_CHARS: usize = 120;

/// Body chars kept in the plain-text rendering
const PLAIN_TEXT_BODY_CHARS: usize = 500;

/// Authors that are the platform itself and not worth showing
const GENERIC_AUTHOR: &str = "Steam";

/// Zero-width space, used for an empty alignment field
const BLANK: &str = "\u{200b}";

/// Field names and fixed strings for one language
#[derive(Debug)]
pub struct Labels {
    pub original_title: &'static str,
    pub author: &'static str,
    pub published: &'static str,
    pub source: &'static str,
    pub read_more: &'static str,
    pub footer: &'static str,
}

const FRENCH: Labels = Labels {
    original_title: "🌐 Titre Original",
    author: "👤 Auteur",
    published: "📅 Publié",
    source: "🔗 Source",
    read_more: "Lire sur Steam",
    footer: "🇫🇷 Traduit automatiquement • Actualités Steam",
};

const ENGLISH: Labels = Labels {
    original_title: "🌐 Original Title",
    author: "👤 Author",
    published: "📅 Published",
    source: "🔗 Source",
    read_more: "Read on Steam",
    footer: "Automatically translated • Steam News",
};

/// Labels for `lang`, English unless French
pub fn labels(lang: &str) -> &'static Labels {
    if lang.eq_ignore_ascii_case("fr") {
        &FRENCH
    } else {
        &ENGLISH
    }
}

/// Translated parts of one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedArticle {
    pub title: String,
    pub body: String,
    /// The excerpt was cut from a longer body
    pub truncated: bool,
}

/// Per-message values that do not come from the article
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub product_name: &'a str,
    pub header_image: Option<&'a str>,
    pub lang: &'a str,
}

/// First `max_chars` chars of `body`, with whether anything was cut
pub fn body_excerpt(body: &str, max_chars: usize) -> (String, bool) {
    if char_len(body) <= max_chars {
        (body.to_string(), false)
    } else {
        (take_chars(body, max_chars), true)
    }
}

/// Lay out one article for delivery
pub fn build_message(
    article: &Article,
    translated: &TranslatedArticle,
    ctx: &MessageContext<'_>,
) -> DeliveryMessage {
    let labels = labels(ctx.lang);

    let mut body = translated.body.clone();
    if translated.truncated {
        body.push_str("...");
    }

    // The feed may already have fallen back to the header for the article image
    let (image_url, thumbnail_url) = match (&article.image_url, ctx.header_image) {
        (Some(image), Some(header)) if image == header => (Some(image.clone()), None),
        (Some(image), header) => (Some(image.clone()), header.map(str::to_string)),
        (None, Some(header)) => (Some(header.to_string()), None),
        (None, None) => (None, None),
    };

    let mut fields = Vec::new();

    let original_title = (article.title != translated.title
        && char_len(&article.title) > ORIGINAL_TITLE_MIN_CHARS)
        .then(|| article.title.clone());
    if let Some(original) = &original_title {
        let mut shown = take_chars(original, ORIGINAL_TITLE_MAX_CHARS);
        if char_len(original) > ORIGINAL_TITLE_MAX_CHARS {
            shown.push_str("...");
        }
        fields.push(DeliveryField::new(
            labels.original_title,
            format!("*{shown}*"),
            false,
        ));
    }

    let author = article
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty() && *a != GENERIC_AUTHOR)
        .map(str::to_string);

    let published = format!("<t:{}:R>", article.published_at);
    let source = format!("[{}]({})", labels.read_more, article.url);

    match &author {
        Some(name) => {
            fields.push(DeliveryField::new(labels.author, name.clone(), true));
            fields.push(DeliveryField::new(labels.published, published, true));
            fields.push(DeliveryField::new(labels.source, source, true));
        }
        None => {
            fields.push(DeliveryField::new(labels.published, published, true));
            fields.push(DeliveryField::new(labels.source, source, true));
            fields.push(DeliveryField::new(BLANK, BLANK, true));
        }
    }

    let plain_text = plain_text(&translated.title, &translated.body, &article.url);

    DeliveryMessage {
        title: translated.title.clone(),
        body,
        source_url: article.url.clone(),
        timestamp: article.published_at,
        product_name: format!("🎮 {}", ctx.product_name),
        author,
        original_title,
        image_url,
        thumbnail_url,
        icon_url: Some(STEAM_ICON_URL.to_string()),
        fields,
        footer: labels.footer.to_string(),
        color: STEAM_COLOR,
        plain_text,
    }
}

/// Plain-text rendering: bold title, short body, link
pub fn plain_text(title: &str, body: &str, url: &str) -> String {
    let mut excerpt = take_chars(body, PLAIN_TEXT_BODY_CHARS);
    if char_len(body) > PLAIN_TEXT_BODY_CHARS {
        excerpt.push_str("...");
    }
    format!("**{title}**\n\n{excerpt}\n\n🔗 {url}")
}

// ============================================================================
// On-demand notices
// ============================================================================

/// No game matched the requested name
pub fn not_found_notice(lang: &str, game_name: &str) -> String {
    if lang.eq_ignore_ascii_case("fr") {
        format!("❌ Impossible de trouver un jeu nommé '{game_name}' sur Steam.")
    } else {
        format!("❌ Could not find a game named '{game_name}' on Steam.")
    }
}

/// The game has no recent news
pub fn no_news_notice(lang: &str, game_title: &str) -> String {
    if lang.eq_ignore_ascii_case("fr") {
        format!("❌ Aucune actualité récente trouvée pour '{game_title}'.")
    } else {
        format!("❌ No recent news found for '{game_title}'.")
    }
}

/// The requester must wait before asking again
pub fn cooldown_notice(lang: &str, remaining_secs: u64) -> String {
    if lang.eq_ignore_ascii_case("fr") {
        format!(
            "⏰ Veuillez attendre {remaining_secs} secondes avant d'utiliser cette commande à nouveau."
        )
    } else {
        format!("⏰ Please wait {remaining_secs} seconds before using this command again.")
    }
}

/// Anything else went wrong
pub fn generic_error_notice(lang: &str) -> String {
    if lang.eq_ignore_ascii_case("fr") {
        "❌ Une erreur s'est produite lors de la récupération des actualités.".to_string()
    } else {
        "❌ Something went wrong while fetching the news. Please try again later.".to_string()
    }
}
