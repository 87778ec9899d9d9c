//! HTML content extraction
//!
//! This module turns a raw HTML document into:
//! - The page title
//! - The visible text, with script, style and noscript content removed
//! - The set of same-domain links, resolved and fragment-stripped
//!
//! Extraction is pure. Malformed markup degrades to empty strings rather than
//! failing, since html5ever recovers from any input.

use crate::url::{extract_domain, strip_fragment};
use scraper::{Html, Node, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Elements whose text is never part of the page body
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Extracted content of an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// The trimmed `<title>` text, empty if absent
    pub title: String,

    /// Visible text nodes, trimmed, non-empty, joined with `\n`
    pub body: String,

    /// Absolute same-domain links without fragments
    pub links: BTreeSet<String>,
}

/// Extracts title, body text and in-scope links from an HTML document
///
/// # Link Extraction Rules
///
/// - Every `<a href>` is resolved against `base_url`
/// - Only links whose authority equals `domain` are kept
/// - Fragments are stripped, so `/a#x` and `/a#y` collapse to `/a`
/// - Links that fail to resolve are skipped
///
/// # Example
///
/// ```
/// use site_harvester::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title> Home </title></head>
///     <body><p>Hello</p><a href="/about#team">About</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html, &base_url, "example.com");
///
/// assert_eq!(page.title, "Home");
/// assert!(page.links.contains("https://example.com/about"));
/// ```
pub fn extract(html: &str, base_url: &Url, domain: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        body: extract_body(&document),
        links: extract_links(&document, base_url, domain),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects every visible text node in document order
fn extract_body(document: &Html) -> String {
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

/// Extracts all in-scope links from the HTML document
fn extract_links(document: &Html, base_url: &Url, domain: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url, domain) {
                links.insert(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute in-scope URL
///
/// Returns None if the link cannot be resolved or points to another
/// authority. Schemes without a host (`mailto:`, `javascript:`) never match,
/// and neither do links carrying userinfo (`https://user@example.com/`).
fn resolve_link(href: &str, base_url: &Url, domain: &str) -> Option<String> {
    let mut absolute_url = base_url.join(href.trim()).ok()?;

    if extract_domain(&absolute_url).as_deref() != Some(domain) {
        return None;
    }

    strip_fragment(&mut absolute_url);
    Some(absolute_url.to_string())
}
