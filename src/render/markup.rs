use super::blocks::{ListItem, RenderedBlock};
use super::inline::Inline;

/// Serializes blocks to HTML. Block text is already escaped, so only the
/// structural tags are added here. Blocks are concatenated without separators.
pub fn to_markup(blocks: &[RenderedBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            RenderedBlock::Paragraph { inlines } => {
                html.push_str("<p>");
                write_inlines(&mut html, inlines);
                html.push_str("</p>");
            }
            RenderedBlock::List { items } => {
                html.push_str(r#"<ul class="numbered-list">"#);
                for item in items {
                    write_item(&mut html, item);
                }
                html.push_str("</ul>");
            }
        }
    }
    html
}

fn write_item(html: &mut String, item: &ListItem) {
    html.push_str("<li><strong>");
    html.push_str(&item.ordinal);
    html.push_str(".</strong>");
    push_with_breaks(html, &item.text);
    html.push_str("</li>");

    for sub in &item.sub_items {
        html.push_str(r#"<li class="sub-item">"#);
        html.push(sub.marker);
        if !sub.text.is_empty() {
            html.push(' ');
            push_with_breaks(html, &sub.text);
        }
        html.push_str("</li>");
    }
}

fn write_inlines(html: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => push_with_breaks(html, text),
            Inline::Bold(text) => {
                html.push_str("<strong>");
                push_with_breaks(html, text);
                html.push_str("</strong>");
            }
            Inline::Italic(text) => {
                html.push_str("<em>");
                push_with_breaks(html, text);
                html.push_str("</em>");
            }
        }
    }
}

fn push_with_breaks(html: &mut String, text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        html.push_str(first);
    }
    for line in lines {
        html.push_str("<br>");
        html.push_str(line);
    }
}
