//! Inline emphasis.
//!
//! `**text**` becomes bold, then `*text*` becomes italic. Italic matching only
//! runs over text left plain by the bold pass, so it never spans a consumed
//! bold marker. Unmatched or mismatched asterisks stay literal.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static RE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern is valid"));
static RE_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern is valid"));

/// A run of already-escaped text. Newlines inside any run are line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
}

pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    for (plain, bold) in split_matches(&RE_BOLD, text) {
        if !plain.is_empty() {
            for (rest, italic) in split_matches(&RE_ITALIC, plain) {
                push_text(&mut spans, rest);
                if let Some(italic) = italic {
                    spans.push(Inline::Italic(italic.to_string()));
                }
            }
        }
        if let Some(bold) = bold {
            spans.push(Inline::Bold(bold.to_string()));
        }
    }
    spans
}

/// Splits `text` into `(text before match, captured group)` pairs. The last
/// pair carries the trailing text and no capture.
fn split_matches<'a>(re: &Regex, text: &'a str) -> Vec<(&'a str, Option<&'a str>)> {
    let mut parts = Vec::new();
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        parts.push((&text[last..whole.start()], Some(inner.as_str())));
        last = whole.end();
    }
    parts.push((&text[last..], None));
    parts
}

fn push_text(spans: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(prev)) = spans.last_mut() {
        prev.push_str(text);
        return;
    }
    spans.push(Inline::Text(text.to_string()));
}
