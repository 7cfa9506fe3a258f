//! Response Renderer.
//!
//! Converts the model's raw answer into sanitized HTML:
//! 1. Escape every markup-significant character
//! 2. Split into blocks on blank lines
//! 3. Render list blocks (numbered items, `-`/`*` sub-items) and prose blocks
//!    (`**bold**`, `*italic*`, line breaks)
//!
//! Rendering never fails. Malformed input degrades to literal text.

mod blocks;
mod escape;
mod inline;
mod markup;

pub use blocks::{ListItem, RenderedBlock, SubItem};
pub use escape::escape_html;
pub use inline::Inline;
pub use markup::to_markup;

use blocks::{build_blocks, split_blocks};

/// Renders raw model text into structured blocks of escaped text.
pub fn render(raw_text: &str) -> Vec<RenderedBlock> {
    let normalized = raw_text.replace("\r\n", "\n");
    let escaped = escape_html(&normalized);
    split_blocks(&escaped)
        .into_iter()
        .flat_map(build_blocks)
        .collect()
}

pub fn render_to_markup(raw_text: &str) -> String {
    to_markup(&render(raw_text))
}
