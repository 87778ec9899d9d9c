//! Page fetcher implementation
//!
//! This module retrieves raw HTML for a URL using two strategies:
//! - A plain HTTP GET with a bounded timeout (the fast path)
//! - A headless browser render when the fast path answers with a
//!   non-success status (the fallback path)
//!
//! Transport failures on the fast path never trigger the fallback.

use crate::config::Config;
use crate::crawler::browser::PageRenderer;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Raw or rendered HTML
        html: String,
        /// True if the HTML came from the browser fallback
        via_browser: bool,
    },

    /// Transport failure or timeout on the plain HTTP path
    NetworkError {
        /// Error description
        cause: String,
    },

    /// The browser fallback failed or was unavailable
    RenderError {
        /// Error description
        cause: String,
        /// Status returned by the plain HTTP path that triggered the fallback
        status_code: u16,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_harvester::config::Config;
/// use site_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.crawler.request_timeout();

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Two-tier page fetcher
///
/// Holds the run's HTTP client and, when available, the shared browser
/// session used for the fallback path.
pub struct PageFetcher {
    client: Client,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl PageFetcher {
    pub fn new(client: Client, renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        Self { client, renderer }
    }

    /// Attaches the browser session used by the fallback path
    pub fn set_renderer(&mut self, renderer: Arc<dyn PageRenderer>) {
        self.renderer = Some(renderer);
    }

    /// Returns true if a browser fallback is available
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Fetches a URL, falling back to the browser on a non-success status
    ///
    /// # Request Flow
    ///
    /// | Plain GET outcome | Action |
    /// |-------------------|--------|
    /// | 2xx | Use the body as-is |
    /// | Other status | Render once in the browser |
    /// | Timeout / connect / body error | `NetworkError`, no fallback |
    ///
    /// Nothing is retried within a crawl pass.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchResult::NetworkError {
                    cause: describe_transport_error(&e),
                }
            }
        };

        let status = response.status();
        if status.is_success() {
            return match response.text().await {
                Ok(html) => FetchResult::Success {
                    html,
                    via_browser: false,
                },
                Err(e) => FetchResult::NetworkError {
                    cause: describe_transport_error(&e),
                },
            };
        }

        tracing::debug!(
            "HTTP {} for {}, falling back to browser render",
            status.as_u16(),
            url
        );

        let Some(renderer) = &self.renderer else {
            return FetchResult::RenderError {
                cause: format!(
                    "HTTP {} and no browser session is available",
                    status.as_u16()
                ),
                status_code: status.as_u16(),
            };
        };

        match renderer.render(url).await {
            Ok(html) => FetchResult::Success {
                html,
                via_browser: true,
            },
            Err(e) => FetchResult::RenderError {
                cause: e.to_string(),
                status_code: status.as_u16(),
            },
        }
    }

    /// Releases the browser session, if any
    ///
    /// Safe to call more than once.
    pub async fn release(&self) -> Result<(), crate::crawler::RenderError> {
        match &self.renderer {
            Some(renderer) => renderer.close().await,
            None => Ok(()),
        }
    }
}

/// Turns a reqwest error into a short cause string
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
