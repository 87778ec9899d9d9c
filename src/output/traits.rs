//! Artifact writer trait and error types
//!
//! This module defines the interface the crawl loop uses to persist page
//! artifacts and terminal snapshots.

use crate::state::{CrawlResult, PageRecord};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write listing: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot derive an artifact path from '{0}'")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persists crawl output
///
/// Implementations must be idempotent per URL: writing a record for a URL
/// that was already written replaces the earlier artifact.
pub trait ArtifactWriter: Send + Sync {
    /// Checks that the output location is usable before the crawl starts
    fn prepare(&self) -> OutputResult<()>;

    /// Writes one page artifact and returns where it was stored
    fn write_page(&self, record: &PageRecord) -> OutputResult<PathBuf>;

    /// Writes the visited, pending and file-URL listings
    fn write_snapshot(&self, result: &CrawlResult) -> OutputResult<()>;
}
