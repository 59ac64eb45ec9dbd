//! Readable text extraction from arbitrary HTML.
//!
//! Regions are tried in priority order; the first one with any visible text
//! wins. The result is whitespace-collapsed and bounded.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use enricher_shared::MAX_REFERENCE_CHARS;

/// Content regions in priority order. `body` is the always-last fallback.
const REGION_PRIORITY: [&str; 3] = ["article", "main", "body"];

/// Elements whose text is never visible prose.
const INVISIBLE_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements rendered on their own line.
const BLOCK_TAGS: [&str; 34] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul", "body",
];

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Extract readable text from an HTML document.
///
/// Returns at most [`MAX_REFERENCE_CHARS`] characters with no consecutive
/// whitespace. An empty document yields an empty string.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    for region in REGION_PRIORITY {
        let text = region_text(&doc, region);
        if !text.trim().is_empty() {
            return normalize_text(&text, MAX_REFERENCE_CHARS);
        }
    }

    String::new()
}

/// Concatenated visible text of every element matching `selector`.
fn region_text(doc: &Html, selector: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };

    let mut out = String::new();
    for el in doc.select(&sel) {
        push_visible_text(el, &mut out);
        out.push(' ');
    }
    out
}

/// Append the text under `el`, skipping invisible elements.
///
/// Block elements are separated by a space; inline elements are not, so
/// `service<b>s</b>` stays one word.
fn push_visible_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if INVISIBLE_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push(' ');
                }
                push_visible_text(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace runs to single spaces, trim, and keep the first
/// `max_chars` characters.
pub fn normalize_text(text: &str, max_chars: usize) -> String {
    let collapsed = WS_RE.replace_all(text.trim(), " ");
    collapsed.chars().take(max_chars).collect()
}
