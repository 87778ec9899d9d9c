//! State module for crawl output data
//!
//! # Components
//!
//! - `PageRecord`: The extracted content of one successfully fetched page
//! - `CrawlResult`: The terminal sets produced by one crawl run
//! - `RunStatus`: How a crawl run ended

mod page;
mod run;

// Re-export main types
pub use page::PageRecord;
pub use run::{CrawlResult, RunStatus};
