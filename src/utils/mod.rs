//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Number of chars (not bytes) in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Take at most `max_chars` chars from `text`
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Truncate text to a maximum number of chars, appending `...` when cut
///
/// The result never exceeds `max_chars` chars, the ellipsis included.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        text.to_string()
    } else {
        let mut truncated = take_chars(text, max_chars.saturating_sub(3));
        truncated.push_str("...");
        truncated
    }
}
