//! Rich-text content sanitizer.
//!
//! All message content passes through [`sanitize`] before it is validated or
//! persisted. The output is restricted to a small allow-list of structural
//! tags; anything else is unwrapped (the tag is dropped, its text kept).
//! Anchors are the one exception with an attribute: `href` survives only for
//! http/https/mailto targets, and every surviving anchor is forced to
//! `rel="noopener noreferrer" target="_blank"`. An anchor with a disallowed
//! href keeps its text but loses the link.
//!
//! `sanitize` is idempotent: cleaning already-clean content is a no-op.

use ammonia::{Builder, UrlRelative};
use std::collections::{HashMap, HashSet};

/// Tags that survive sanitization.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "em", "i", "strong", "b", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "code", "pre", "a",
];

/// URL schemes an anchor may point at.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn rich_text_builder() -> Builder<'static> {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", HashSet::from_iter(["href"]));

    let mut builder = Builder::default();
    builder
        .tags(HashSet::from_iter(ALLOWED_TAGS.iter().copied()))
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(HashSet::from_iter(ALLOWED_SCHEMES.iter().copied()))
        .url_relative(UrlRelative::Deny)
        .link_rel(Some("noopener noreferrer"))
        .set_tag_attribute_value("a", "target", "_blank")
        // Unwrap script/style like any other disallowed tag instead of
        // discarding their contents wholesale.
        .clean_content_tags(HashSet::new());
    builder
}

fn text_only_builder() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .tags(HashSet::new())
        .generic_attributes(HashSet::new())
        .clean_content_tags(HashSet::new());
    builder
}

/// Normalize rich-text HTML to the safe canonical subset.
pub fn sanitize(html: &str) -> String {
    rich_text_builder().clean(html).to_string()
}

/// True when no visible text remains after sanitizing.
///
/// Markup-only and whitespace-only input (including entity whitespace such
/// as `&nbsp;`) counts as empty.
pub fn is_empty(html: &str) -> bool {
    let text = text_only_builder().clean(html).to_string();
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .chars()
        .all(char::is_whitespace)
}
