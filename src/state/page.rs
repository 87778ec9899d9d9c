use serde::{Deserialize, Serialize};

/// The extracted content of one crawled page
///
/// Serialized with fields in declaration order (`url`, `title`, `body`), which
/// is the on-disk artifact layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The URL the page was fetched from
    pub url: String,

    /// The trimmed document title, empty if absent
    pub title: String,

    /// Visible text, one trimmed text node per line
    pub body: String,
}

impl PageRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    /// Returns true if extraction produced neither a title nor any text
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order() {
        let record = PageRecord::new("https://example.com/", "Home", "Hello");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"url":"https://example.com/","title":"Home","body":"Hello"}"#
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(PageRecord::new("https://example.com/", "", "").is_empty());
        assert!(!PageRecord::new("https://example.com/", "", "text").is_empty());
        assert!(!PageRecord::new("https://example.com/", "Title", "").is_empty());
    }
}
