use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Seed used when neither the config file nor `TARGET_URL` names one
pub const DEFAULT_TARGET_URL: &str = "https://www.bestbuddies.org.qa/";

/// Blob container used with a connection string unless configured
pub const DEFAULT_CONTAINER: &str = "webcontent";

/// Main configuration structure for Site-Harvester
///
/// Every section and key has a default, so an empty file (or no file at all)
/// is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
    pub publish: PublishConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Seed URL; its authority bounds the crawl
    #[serde(rename = "target-url")]
    pub target_url: String,

    /// Minimum time between successive fetch attempts (milliseconds)
    #[serde(rename = "politeness-delay")]
    pub politeness_delay: u64,

    /// Timeout for the plain HTTP fetch (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Stop after this many fetch attempts
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Do not follow links more than this many hops from the seed
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            politeness_delay: 1000,
            request_timeout: 10_000,
            max_pages: None,
            max_depth: None,
        }
    }
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Whether and how the headless browser fallback is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// Launch the browser; abort the run if it cannot start
    #[default]
    Required,
    /// Launch the browser; crawl without a fallback if it cannot start
    Auto,
    /// Never launch a browser
    Disabled,
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub mode: BrowserMode,

    /// Time to let client-side scripts render after navigation (milliseconds)
    #[serde(rename = "settle-time")]
    pub settle_time: u64,

    /// Upper bound on a single browser navigation (milliseconds)
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    /// Chrome/Chromium binary; auto-detected when unset
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            mode: BrowserMode::Required,
            settle_time: 3000,
            navigation_timeout: 30_000,
            chrome_executable: None,
        }
    }
}

impl BrowserConfig {
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one JSON artifact per page
    #[serde(rename = "content-dir")]
    pub content_dir: String,

    /// Directory receiving the three snapshot listings
    #[serde(rename = "snapshot-dir")]
    pub snapshot_dir: String,

    #[serde(rename = "visited-file")]
    pub visited_file: String,

    #[serde(rename = "pending-file")]
    pub pending_file: String,

    #[serde(rename = "file-urls-file")]
    pub file_urls_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: "output_content".to_string(),
            snapshot_dir: ".".to_string(),
            visited_file: "visited_urls.csv".to_string(),
            pending_file: "to_visit_urls.csv".to_string(),
            file_urls_file: "file_urls.csv".to_string(),
        }
    }
}

/// Downstream publishing configuration
///
/// Upload runs when `container-url` or `connection-string` is set; the
/// indexer trigger runs when `indexer-name`, `search-api-key` and either
/// `search-service` or `search-endpoint` are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Blob container URL including a SAS token
    #[serde(rename = "container-url")]
    pub container_url: Option<String>,

    /// Storage account connection string, used when `container-url` is unset
    #[serde(rename = "connection-string")]
    pub connection_string: Option<String>,

    /// Container the connection string uploads into
    pub container: String,

    /// Search service name, expanded to `https://<name>.search.windows.net`
    #[serde(rename = "search-service")]
    pub search_service: Option<String>,

    /// Explicit search endpoint, takes precedence over `search-service`
    #[serde(rename = "search-endpoint")]
    pub search_endpoint: Option<String>,

    #[serde(rename = "indexer-name")]
    pub indexer_name: Option<String>,

    #[serde(rename = "search-api-key")]
    pub search_api_key: Option<String>,

    #[serde(rename = "api-version")]
    pub api_version: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            container_url: None,
            connection_string: None,
            container: DEFAULT_CONTAINER.to_string(),
            search_service: None,
            search_endpoint: None,
            indexer_name: None,
            search_api_key: None,
            api_version: "2023-10-01".to_string(),
        }
    }
}

impl PublishConfig {
    /// The search endpoint, derived from the service name if not set
    pub fn resolved_search_endpoint(&self) -> Option<String> {
        self.search_endpoint.clone().or_else(|| {
            self.search_service
                .as_ref()
                .map(|name| format!("https://{}.search.windows.net", name))
        })
    }
}
