//! Block structure of a model answer.
//!
//! The escaped answer is split into blocks on blank lines. A block is a list
//! block when any of its lines starts with `<digits>.`; otherwise it is prose.
//! List blocks are walked line by line with a two-state machine:
//!
//! - `InProse`: lines before the first ordinal item; they form a lead paragraph
//! - `InList`: an ordinal line opens an item, a `-`/`*` line adds a sub-item to
//!   the open item, and any other line continues the last opened item or sub-item

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::inline::{parse_inline, Inline};

static RE_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedBlock {
    Paragraph { inlines: Vec<Inline> },
    List { items: Vec<ListItem> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    /// Digits before the period, e.g. `"1"`.
    pub ordinal: String,
    pub text: String,
    pub sub_items: Vec<SubItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubItem {
    pub marker: char,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Ordinal { ordinal: &'a str, rest: &'a str },
    SubItem { marker: char, text: &'a str },
    Blank,
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InProse,
    InList,
}

/// Splits text on one or more blank lines, dropping whitespace-only blocks.
pub fn split_blocks(text: &str) -> Vec<&str> {
    RE_BLANK_LINES
        .split(text)
        .map(|block| block.trim_matches('\n'))
        .filter(|block| !block.trim().is_empty())
        .collect()
}

pub fn is_list_block(block: &str) -> bool {
    block.lines().any(|line| ordinal_prefix(line).is_some())
}

/// Builds the blocks for one already-escaped block of text.
pub fn build_blocks(block: &str) -> Vec<RenderedBlock> {
    if !is_list_block(block) {
        return vec![paragraph(block)];
    }
    ListParser::default().parse(block)
}

fn paragraph(text: &str) -> RenderedBlock {
    RenderedBlock::Paragraph {
        inlines: parse_inline(text),
    }
}

/// Returns `(ordinal, rest)` when the line starts with `<digits>.` at column 0.
fn ordinal_prefix(line: &str) -> Option<(&str, &str)> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    line[digits..]
        .strip_prefix('.')
        .map(|rest| (&line[..digits], rest))
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some((ordinal, rest)) = ordinal_prefix(line) {
        return LineKind::Ordinal { ordinal, rest };
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(marker @ ('-' | '*')) => LineKind::SubItem {
            marker,
            text: chars.as_str().trim_start(),
        },
        _ => LineKind::Text(trimmed),
    }
}

#[derive(Debug)]
struct ListParser {
    state: State,
    lead: Vec<String>,
    items: Vec<ListItem>,
    /// Whether the last opened entry is a sub-item rather than the item itself.
    in_sub_item: bool,
}

impl Default for ListParser {
    fn default() -> Self {
        Self {
            state: State::InProse,
            lead: Vec::new(),
            items: Vec::new(),
            in_sub_item: false,
        }
    }
}

impl ListParser {
    fn parse(mut self, block: &str) -> Vec<RenderedBlock> {
        for line in block.lines() {
            self.feed(line);
        }
        self.finish()
    }

    fn feed(&mut self, line: &str) {
        let kind = classify(line);
        match (self.state, kind) {
            (_, LineKind::Ordinal { ordinal, rest }) => {
                self.state = State::InList;
                self.in_sub_item = false;
                self.items.push(ListItem {
                    ordinal: ordinal.to_string(),
                    text: rest.trim_end().to_string(),
                    sub_items: Vec::new(),
                });
            }
            (_, LineKind::Blank) => {}
            (State::InProse, _) => self.lead.push(line.to_string()),
            (State::InList, LineKind::SubItem { marker, text }) => {
                if let Some(item) = self.items.last_mut() {
                    item.sub_items.push(SubItem {
                        marker,
                        text: text.to_string(),
                    });
                    self.in_sub_item = true;
                }
            }
            (State::InList, LineKind::Text(text)) => self.continue_last(text),
        }
    }

    fn continue_last(&mut self, text: &str) {
        let Some(item) = self.items.last_mut() else {
            return;
        };
        match item.sub_items.last_mut() {
            Some(sub) if self.in_sub_item => {
                if !sub.text.is_empty() {
                    sub.text.push(' ');
                }
                sub.text.push_str(text);
            }
            // Item text keeps what followed the period, so it always gets a separator.
            _ => {
                item.text.push(' ');
                item.text.push_str(text);
            }
        }
    }

    fn finish(self) -> Vec<RenderedBlock> {
        let mut blocks = Vec::with_capacity(2);
        if !self.lead.is_empty() {
            blocks.push(paragraph(&self.lead.join("\n")));
        }
        if !self.items.is_empty() {
            blocks.push(RenderedBlock::List { items: self.items });
        }
        blocks
    }
}
