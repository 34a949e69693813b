//! Sentence-boundary truncation for translation payloads
//!
//! All lengths are counted in chars so multi-byte text never splits
//! mid-character.

use crate::utils::{char_len, normalize_whitespace, take_chars};

const SENTENCE_SEPARATOR: &str = ". ";

/// Collapse whitespace and cut `text` to at most `max_chars` chars
///
/// Whole sentences (split on `". "`) are kept while the running length,
/// separators included, fits the limit. When not even the first sentence
/// fits, the text is hard-truncated.
///
/// # Examples
///
/// ```
/// use steamcast::translation::truncate::prepare_text;
///
/// let text = "First sentence. Second sentence. Third one is long.";
/// assert_eq!(prepare_text(text, 34), "First sentence. Second sentence.");
/// ```
pub fn prepare_text(text: &str, max_chars: usize) -> String {
    let text = normalize_whitespace(text);
    if char_len(&text) <= max_chars {
        return text;
    }

    let mut result = String::new();
    let mut result_len = 0;
    for sentence in text.split(SENTENCE_SEPARATOR) {
        let piece_len = char_len(sentence) + SENTENCE_SEPARATOR.len();
        if result_len + piece_len > max_chars {
            break;
        }
        result.push_str(sentence);
        result.push_str(SENTENCE_SEPARATOR);
        result_len += piece_len;
    }

    let trimmed = result.trim_end();
    if trimmed.is_empty() {
        take_chars(&text, max_chars).trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}
