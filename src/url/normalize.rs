use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used as the crawl dedup key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than HTTP and HTTPS
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Parsing already lowercases the host, resolves dot segments and drops
/// default ports. Query strings are kept verbatim: `?a=1&b=2` and `?b=2&a=1`
/// remain distinct URLs, as do `/page` and `/page/`.
///
/// # Examples
///
/// ```
/// use site_harvester::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/a/../b?x=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    strip_fragment(&mut url);
    Ok(url)
}

/// Removes the fragment identifier from a URL in place
pub fn strip_fragment(url: &mut Url) {
    url.set_fragment(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_fragments_collapse() {
        let a = normalize_url("https://x.com/a#s1").unwrap();
        let b = normalize_url("https://x.com/a#s2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://x.com/a");
    }

    #[test]
    fn test_query_order_is_preserved() {
        let a = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        let b = normalize_url("https://example.com/page?a=1&b=2").unwrap();
        assert_eq!(a.as_str(), "https://example.com/page?b=2&a=1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_trailing_slash_is_preserved() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page/");
    }

    #[test]
    fn test_scheme_is_preserved() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_dot_segments_resolved() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize_url("not a url").unwrap_err(),
            UrlError::Parse(_)
        ));
    }

    #[test]
    fn test_strip_fragment_in_place() {
        let mut url = Url::parse("https://example.com/?q=1#frag").unwrap();
        strip_fragment(&mut url);
        assert_eq!(url.as_str(), "https://example.com/?q=1");
    }
}
