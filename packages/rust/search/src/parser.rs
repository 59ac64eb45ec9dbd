//! Search results page parser.
//!
//! Organic results are `a.result__a` anchors. Their `href` is usually a
//! protocol-relative redirect wrapper such as
//! `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=...`,
//! whose real destination is the percent-encoded `uddg` parameter.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Matches organic result links in document (rank) order.
static RESULT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("result link selector"));

/// Query parameter carrying the real destination of a redirect-wrapped link.
pub const REDIRECT_PARAM: &str = "uddg";

/// Extract up to `limit` result links from a results page, decoded.
///
/// Anchors without an `href` or with an unparseable one are skipped and do
/// not count towards `limit`.
pub fn extract_result_links(html: &str, base: &Url, limit: usize) -> Vec<String> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_LINK_SEL)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| {
            let decoded = decode_result_link(href, base);
            if decoded.is_none() {
                debug!(href, "skipping unparseable result link");
            }
            decoded
        })
        .take(limit)
        .collect()
}

/// Normalize one raw result `href` into the destination URL.
///
/// - `//host/path` is upgraded to `https://host/path`
/// - a path-relative href is resolved against `base`
/// - a redirect wrapper yields its decoded [`REDIRECT_PARAM`] value
/// - any other absolute link is returned unchanged
pub fn decode_result_link(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let absolute = upgrade_protocol_relative(raw);

    let (parsed, relative) = match Url::parse(&absolute) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) => (base.join(&absolute).ok()?, true),
        Err(_) => return None,
    };

    if let Some(target) = redirect_target(&parsed) {
        return Some(target);
    }

    if relative {
        Some(parsed.into())
    } else {
        Some(absolute)
    }
}

/// Prefix a protocol-relative link with the secure scheme.
pub fn upgrade_protocol_relative(link: &str) -> String {
    match link.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => link.to_string(),
    }
}

/// The decoded redirect destination, if `url` is a redirect wrapper.
fn redirect_target(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
