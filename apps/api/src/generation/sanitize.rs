//! Strips the decoration models add around the content
//! a caller actually asked for.
//!
//! Typical artifacts: "Title:" style labels, list numbering, wrapping quotes,
//! and an explanation appended after a one-line answer. Every rule set is a
//! pure function: same input, same output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which cleanup rule set to apply. Chosen by the caller, never inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizationMode {
    Title,
    Article,
    #[default]
    General,
}

static TITLE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:blog post title:|blog title:|suggested title:|title:|here (?:is|are).+?:)")
        .expect("valid regex")
});

static ENUMERATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

static ARTICLE_INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:here is the article:|here's the article:|here's the content:|here is the content:|article:)")
        .expect("valid regex")
});

const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

/// Applies the rule set for `mode` to `raw`.
pub fn sanitize(raw: &str, mode: SanitizationMode) -> String {
    match mode {
        SanitizationMode::Title => sanitize_title(raw),
        SanitizationMode::Article => sanitize_article(raw),
        SanitizationMode::General => raw.trim().to_string(),
    }
}

/// Reduces a response to a single bare title line.
///
/// The pass is repeated until it stops changing the text, so nested
/// decoration (`Title: "1. Foo"`) is fully removed and a second call is
/// always a no-op. Each pass only ever shortens the text, so this terminates.
pub fn sanitize_title(raw: &str) -> String {
    let mut current = title_pass(raw);
    loop {
        let next = title_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn title_pass(text: &str) -> String {
    let text = TITLE_LABEL_RE.replace(text.trim(), "");
    let text = ENUMERATION_RE.replace(text.trim_start(), "");
    let text = strip_quote_pair(text.trim());

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Drops an introductory label but keeps paragraph and list structure intact.
pub fn sanitize_article(raw: &str) -> String {
    ARTICLE_INTRO_RE
        .replace(raw.trim_start(), "")
        .trim()
        .to_string()
}

/// Removes one matching pair of surrounding quote characters, if present.
pub fn strip_quote_pair(text: &str) -> &str {
    let mut chars = text.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return text;
    };

    if QUOTE_PAIRS
        .iter()
        .any(|&(open, close)| first == open && last == close)
    {
        &text[first.len_utf8()..text.len() - last.len_utf8()]
    } else {
        text
    }
}
