//! URL handling module for Site-Harvester
//!
//! This module provides the crawl scope boundary (`Target`), the dedup-key
//! normalization, and the page-vs-file classification of discovered links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, Target};
pub use normalize::{normalize_url, strip_fragment};

use url::Url;

/// Path suffixes treated as non-HTML resources (compared case-insensitively)
pub const FILE_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".doc", ".docx", ".xls", ".xlsx",
];

/// Classification of a discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// A page that should be fetched and extracted
    Html,
    /// A document, image or archive that is recorded but never fetched
    File,
}

impl UrlKind {
    /// Returns true if the URL should be fetched
    pub fn should_fetch(&self) -> bool {
        matches!(self, Self::Html)
    }
}

/// Classifies a URL by the extension of its path component
///
/// The query string and fragment are ignored, so `/report.pdf?v=2` is still a
/// file.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvester::url::{classify_url, UrlKind};
///
/// let url = Url::parse("https://example.com/files/Report.PDF").unwrap();
/// assert_eq!(classify_url(&url), UrlKind::File);
///
/// let url = Url::parse("https://example.com/about").unwrap();
/// assert_eq!(classify_url(&url), UrlKind::Html);
/// ```
pub fn classify_url(url: &Url) -> UrlKind {
    let path = url.path().to_ascii_lowercase();

    if FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        UrlKind::File
    } else {
        UrlKind::Html
    }
}
