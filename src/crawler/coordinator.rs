//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Acquiring and releasing the browser session
//! - Pacing fetches with the politeness delay
//! - Coordinating fetching, extraction, and link discovery
//! - Persisting page artifacts
//! - Handling interrupts and writing the final snapshot

use crate::config::{BrowserMode, Config};
use crate::crawler::browser::{ChromeSession, PageRenderer};
use crate::crawler::fetcher::{build_http_client, FetchResult, PageFetcher};
use crate::crawler::frontier::{Admission, Frontier, FrontierEntry};
use crate::crawler::parser::extract;
use crate::output::{ArtifactWriter, FsArtifactWriter};
use crate::state::{CrawlResult, PageRecord, RunStatus};
use crate::url::Target;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Main crawler coordinator structure
///
/// Owns the frontier for the lifetime of one run. The browser session (if
/// any) lives inside the fetcher and is released by every exit path of
/// [`Coordinator::run_until`].
pub struct Coordinator {
    config: Config,
    frontier: Frontier,
    fetcher: PageFetcher,
    writer: Box<dyn ArtifactWriter>,
    failed: BTreeSet<String>,
    unsaved: BTreeSet<String>,
    started_at: DateTime<Utc>,
    rendered: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `renderer` - Browser session for the fallback path, if any
    /// * `writer` - Destination for page artifacts and the snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid target URL or HTTP client failure
    pub fn new(
        config: Config,
        renderer: Option<Arc<dyn PageRenderer>>,
        writer: Box<dyn ArtifactWriter>,
    ) -> Result<Self, HarvestError> {
        let target = Target::parse(&config.crawler.target_url)?;
        let client = build_http_client(&config)?;
        let frontier = Frontier::new(target, config.crawler.max_depth);

        Ok(Self {
            config,
            frontier,
            fetcher: PageFetcher::new(client, renderer),
            writer,
            failed: BTreeSet::new(),
            unsaved: BTreeSet::new(),
            started_at: Utc::now(),
            rendered: 0,
        })
    }

    /// Creates a coordinator with a filesystem writer and the browser
    /// session selected by `[browser] mode`
    ///
    /// In `required` mode a launch failure aborts the run: the snapshot is
    /// written with the seed still pending and `HarvestError::Resource` is
    /// returned.
    pub async fn launch(config: Config) -> Result<Self, HarvestError> {
        let writer = Box::new(FsArtifactWriter::from_config(&config.output));
        let mut coordinator = Self::new(config, None, writer)?;

        let mode = coordinator.config.browser.mode;
        if mode == BrowserMode::Disabled {
            tracing::info!("Browser fallback disabled");
            return Ok(coordinator);
        }

        let launched = ChromeSession::launch(&coordinator.config.browser).await;
        match launched {
            Ok(session) => coordinator.fetcher.set_renderer(Arc::new(session)),
            Err(e) if mode == BrowserMode::Auto => {
                tracing::warn!("{}; continuing without browser fallback", e);
            }
            Err(e) => {
                return Err(coordinator
                    .abort(HarvestError::Resource(e.to_string()))
                    .await)
            }
        }

        Ok(coordinator)
    }

    /// Runs the crawl until the frontier is exhausted
    pub async fn run(self) -> Result<CrawlResult, HarvestError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until the frontier is exhausted, the page budget is
    /// spent, or `shutdown` resolves
    ///
    /// Per-URL failures never end the run. The snapshot is written on every
    /// exit path, including aborts.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<CrawlResult, HarvestError>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.writer.prepare() {
            return Err(self
                .abort(HarvestError::StorageUnavailable(e.to_string()))
                .await);
        }

        tokio::pin!(shutdown);

        tracing::info!(
            "Starting crawl of {} (scope: {})",
            self.frontier.target().url(),
            self.frontier.target().domain()
        );

        let delay = self.config.crawler.politeness_delay();
        let max_pages = self.config.crawler.max_pages;
        let start_time = std::time::Instant::now();
        let mut last_fetch: Option<Instant> = None;
        let mut attempts = 0usize;

        let status = loop {
            if self.frontier.is_exhausted() {
                tracing::info!("Frontier is empty, crawl complete");
                break RunStatus::Completed;
            }

            if max_pages.is_some_and(|max| attempts >= max) {
                tracing::info!(
                    "Page budget of {} reached with {} URLs pending",
                    attempts,
                    self.frontier.pending_len()
                );
                break RunStatus::Truncated;
            }

            // Politeness delay between successive fetch attempts
            let ready = last_fetch.map_or_else(Instant::now, |last| last + delay);
            let interrupted = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = tokio::time::sleep_until(ready) => false,
            };
            if interrupted {
                tracing::info!("Crawl interrupted");
                break RunStatus::Interrupted;
            }

            let Some(entry) = self.frontier.next() else {
                break RunStatus::Completed;
            };
            last_fetch = Some(Instant::now());
            attempts += 1;

            let interrupted = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = self.process_entry(&entry) => false,
            };
            if interrupted {
                tracing::info!("Crawl interrupted while fetching {}", entry.url);
                self.failed.insert(entry.url.to_string());
                break RunStatus::Interrupted;
            }

            if attempts % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = attempts as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier, {} file URLs, {:.2} pages/sec",
                    self.frontier.visited_len(),
                    self.frontier.pending_len(),
                    self.frontier.file_urls_len(),
                    rate
                );
            }
        };

        tracing::info!(
            "Crawl {}: {} pages visited in {:?} ({} failed, {} rendered in browser)",
            status,
            self.frontier.visited_len(),
            start_time.elapsed(),
            self.failed.len(),
            self.rendered
        );

        self.finish(status).await
    }

    /// Fetches one entry, persists its artifact and offers its links
    ///
    /// Every failure is logged and recorded; nothing here ends the run.
    async fn process_entry(&mut self, entry: &FrontierEntry) {
        let url = entry.url.as_str();
        tracing::debug!("Fetching {} (depth {})", url, entry.depth);

        let html = match self.fetcher.fetch(url).await {
            FetchResult::Success { html, via_browser } => {
                if via_browser {
                    self.rendered += 1;
                    tracing::debug!("Rendered {} in browser", url);
                }
                html
            }
            FetchResult::NetworkError { cause } => {
                tracing::warn!("Network error for {}: {}", url, cause);
                self.failed.insert(url.to_string());
                return;
            }
            FetchResult::RenderError { cause, status_code } => {
                tracing::warn!(
                    "Render error for {} (HTTP {}): {}",
                    url,
                    status_code,
                    cause
                );
                self.failed.insert(url.to_string());
                return;
            }
        };

        let page = extract(&html, &entry.url, self.frontier.target().domain());
        let record = PageRecord::new(url, page.title, page.body);
        if record.is_empty() {
            tracing::debug!("No text extracted from {}", url);
        }

        match self.writer.write_page(&record) {
            Ok(path) => tracing::debug!("Saved {} to {}", url, path.display()),
            Err(e) => {
                tracing::error!("Failed to save content for {}: {}", url, e);
                self.unsaved.insert(url.to_string());
            }
        }

        let depth = entry.depth.saturating_add(1);
        let mut queued = 0usize;
        for link in &page.links {
            if self.frontier.offer(link, depth) == Admission::Queued {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} links found, {} newly queued",
            url,
            page.links.len(),
            queued
        );
    }

    /// Releases the browser session and writes the snapshot
    async fn finish(self, status: RunStatus) -> Result<CrawlResult, HarvestError> {
        if let Err(e) = self.fetcher.release().await {
            tracing::error!("Failed to release browser session: {}", e);
        }

        let result =
            self.frontier
                .into_result(status, self.failed, self.unsaved, self.started_at);

        if let Err(e) = self.writer.write_snapshot(&result) {
            tracing::error!("Failed to write crawl snapshot: {}", e);
            return Err(e.into());
        }

        Ok(result)
    }

    /// Ends the run with status `Aborted`, returning the error that caused it
    async fn abort(self, error: HarvestError) -> HarvestError {
        tracing::error!("Aborting crawl: {}", error);
        if let Err(e) = self.finish(RunStatus::Aborted).await {
            tracing::error!("Snapshot after abort also failed: {}", e);
        }
        error
    }
}

/// Runs the main crawl operation
///
/// Launches the browser session per configuration, crawls until the frontier
/// is exhausted or Ctrl-C is pressed, releases the session and writes the
/// snapshot.
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The terminal crawl state
/// * `Err(HarvestError)` - The run was aborted
///
/// # Example
///
/// ```no_run
/// use site_harvester::config::Config;
/// use site_harvester::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = run_crawl(Config::default()).await?;
/// println!("{} pages visited", result.visited.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlResult, HarvestError> {
    let coordinator = Coordinator::launch(config).await?;
    coordinator.run_until(shutdown_signal()).await
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, stopping after the current page"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
