//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier queue and visited/file-URL bookkeeping
//! - Two-tier fetching (plain HTTP, then headless browser)
//! - HTML content and link extraction
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use browser::{ChromeSession, PageRenderer, RenderError};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchResult, PageFetcher};
pub use frontier::{Admission, Frontier, FrontierEntry};
pub use parser::{extract, ExtractedPage};
