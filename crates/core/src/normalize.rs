//! Text normalization for captured HTML text.
//!
//! HTML collapses whitespace when rendering, so captured element text is
//! collapsed the same way before it lands in a slide. Speaker notes keep their
//! line structure.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse any whitespace run (including newlines and NBSP) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Text normalizer for element and notes text.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Whether to apply Unicode NFC composition.
    compose_unicode: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a normalizer with NFC composition enabled.
    pub fn new() -> Self {
        Self {
            compose_unicode: true,
        }
    }

    /// Set whether to apply Unicode NFC composition.
    pub fn with_compose_unicode(mut self, compose: bool) -> Self {
        self.compose_unicode = compose;
        self
    }

    /// Normalize inline element text to a single trimmed line.
    pub fn normalize_inline(&self, text: &str) -> String {
        // Control characters are not allowed in XML text; whitespace ones collapse below.
        let composed: String = self
            .compose(text)
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect();
        WHITESPACE_COLLAPSE_REGEX
            .replace_all(&composed, " ")
            .trim()
            .to_string()
    }

    /// Normalize multi-line text, keeping non-empty lines.
    pub fn normalize_block(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        text.lines()
            .map(|line| self.normalize_inline(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn compose(&self, text: &str) -> String {
        if self.compose_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        }
    }
}

/// Shorten text to at most `max_chars` characters for log output.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
