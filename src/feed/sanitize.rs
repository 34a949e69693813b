//! Markup stripping for Steam news titles and bodies
//!
//! Steam news contents mix HTML and BBCode. Cleaning is tolerant: tags are
//! removed, a fixed entity table is decoded, and anything unrecognized is
//! left as-is rather than rejected.

use regex::Regex;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

/// Tags that separate words; every other tag is removed without a gap
static BLOCK_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|br|hr|h[1-6]|li|ul|ol|table|tr|td|th|blockquote|section|article|header|footer|pre)\b[^>]*>")
        .expect("Invalid block tag regex")
});

static BBCODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[/?(?:b|i|u|s|h[1-6]|url(?:=[^\]]*)?|img|list|olist|\*|p|quote(?:=[^\]]*)?|code|spoiler|strike|hr|table|tr|td|th|noparse|previewyoutube(?:=[^\]]*)?)\]")
        .expect("Invalid bbcode regex")
});

static BBCODE_IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[img\].*?\[/img\]").expect("Invalid bbcode img regex")
});

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Entities decoded after tag removal. Order matters: `&amp;` goes last so
/// `&amp;lt;` decodes to the literal `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&#160;", " "),
    ("&#xa0;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Strip markup and normalize whitespace
///
/// # Examples
///
/// ```
/// use steamcast::feed::sanitize::clean_markup;
///
/// let clean = clean_markup("<p>Patch&nbsp;<b>1.2</b> is out &amp; live</p>");
/// assert_eq!(clean, "Patch 1.2 is out & live");
/// ```
pub fn clean_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_images = BBCODE_IMG_REGEX.replace_all(text, " ");
    let with_breaks = BLOCK_TAG_REGEX.replace_all(&without_images, " ");
    let without_tags = TAG_REGEX.replace_all(&with_breaks, "");
    let without_bbcode = BBCODE_REGEX.replace_all(&without_tags, " ");
    let decoded = decode_entities(&without_bbcode);

    WHITESPACE_REGEX
        .replace_all(decoded.trim(), " ")
        .to_string()
}

/// Decode the fixed entity table; unknown entities are kept verbatim
pub fn decode_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_html_tags() {
        assert_eq!(
            clean_markup("<h1>Big</h1><p>Update <a href=\"x\">here</a></p>"),
            "Big Update here"
        );
    }

    #[test]
    fn test_inline_tags_keep_words_joined() {
        assert_eq!(clean_markup("Up<b>date</b> <i>now</i>"), "Update now");
        assert_eq!(clean_markup("<p>One</p><p>Two</p>line<br/>break"), "One Two line break");
    }

    #[test]
    fn test_strips_bbcode() {
        let raw = "[h1]Patch Notes[/h1][list][*]Fixed crash[*]New map[/list]";
        assert_eq!(clean_markup(raw), "Patch Notes Fixed crash New map");
    }

    #[test]
    fn test_drops_bbcode_images() {
        let raw = "Intro [img]{STEAM_CLAN_IMAGE}/1/abc.png[/img] outro";
        assert_eq!(clean_markup(raw), "Intro outro");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &quot;c&quot; &#39;d&#39;"), "a <b> \"c\" 'd'");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unknown_markup_left_intact() {
        assert_eq!(clean_markup("5 &hearts; [custom]tag"), "5 &hearts; [custom]tag");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_markup(""), "");
        assert_eq!(clean_markup("   "), "");
    }
}
