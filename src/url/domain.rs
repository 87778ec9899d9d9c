use crate::url::normalize::normalize_url;
use crate::UrlError;
use url::Url;

/// Extracts the authority used for scope checks from a URL
///
/// The authority is the lowercase host plus the port when it differs from the
/// scheme default, so `https://example.com:443/` and `https://example.com/`
/// share a domain while a mock server on `127.0.0.1:8080` keeps its port.
/// Userinfo is part of the authority: `https://user@example.com/` is not in
/// the scope of `https://example.com/`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvester::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
///
/// let url = Url::parse("https://guest@example.com/").unwrap();
/// assert_eq!(extract_domain(&url), Some("guest@example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host_port = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    };

    Some(match (url.username(), url.password()) {
        ("", None) => host_port,
        (user, None) => format!("{}@{}", user, host_port),
        (user, Some(password)) => format!("{}:{}@{}", user, password, host_port),
    })
}

/// The seed of a crawl and the scope boundary derived from it
///
/// Immutable once built: every URL whose authority differs from
/// [`Target::domain`] is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    domain: String,
}

impl Target {
    /// Parses a seed URL into a target
    pub fn parse(seed: &str) -> Result<Self, UrlError> {
        let url = normalize_url(seed)?;
        let domain = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
        Ok(Self { url, domain })
    }

    /// The normalized seed URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The authority every in-scope URL must share
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the URL belongs to this target's domain
    pub fn contains(&self, url: &Url) -> bool {
        extract_domain(url).as_deref() == Some(self.domain.as_str())
    }
}
