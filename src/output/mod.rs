//! Output module for persisting crawl artifacts
//!
//! This module handles:
//! - Writing one JSON document per extracted page
//! - Writing the visited, pending and file-URL listings
//! - Summarizing run statistics

mod artifact;
mod snapshot;
pub mod stats;
mod traits;

pub use artifact::{artifact_relative_path, render_artifact, write_artifact, INDEX_PLACEHOLDER};
pub use snapshot::{write_listing, LISTING_HEADER};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{ArtifactWriter, OutputError, OutputResult};

use crate::config::OutputConfig;
use crate::state::{CrawlResult, PageRecord};
use std::fs;
use std::path::PathBuf;

/// Filesystem artifact writer
///
/// Page artifacts go under `content_dir`; the three listings go into
/// `snapshot_dir`.
#[derive(Debug, Clone)]
pub struct FsArtifactWriter {
    content_dir: PathBuf,
    snapshot_dir: PathBuf,
    visited_file: String,
    pending_file: String,
    file_urls_file: String,
}

impl FsArtifactWriter {
    pub fn new(content_dir: impl Into<PathBuf>, snapshot_dir: impl Into<PathBuf>) -> Self {
        let defaults = OutputConfig::default();
        Self {
            content_dir: content_dir.into(),
            snapshot_dir: snapshot_dir.into(),
            visited_file: defaults.visited_file,
            pending_file: defaults.pending_file,
            file_urls_file: defaults.file_urls_file,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            content_dir: PathBuf::from(&config.content_dir),
            snapshot_dir: PathBuf::from(&config.snapshot_dir),
            visited_file: config.visited_file.clone(),
            pending_file: config.pending_file.clone(),
            file_urls_file: config.file_urls_file.clone(),
        }
    }

    pub fn visited_path(&self) -> PathBuf {
        self.snapshot_dir.join(&self.visited_file)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.snapshot_dir.join(&self.pending_file)
    }

    pub fn file_urls_path(&self) -> PathBuf {
        self.snapshot_dir.join(&self.file_urls_file)
    }
}

impl ArtifactWriter for FsArtifactWriter {
    fn prepare(&self) -> OutputResult<()> {
        for dir in [&self.content_dir, &self.snapshot_dir] {
            fs::create_dir_all(dir).map_err(|source| OutputError::Write {
                path: dir.clone(),
                source,
            })?;
        }

        // Check write access before any page is fetched
        let marker = self.content_dir.join(".write-check");
        fs::write(&marker, b"").map_err(|source| OutputError::Write {
            path: marker.clone(),
            source,
        })?;
        fs::remove_file(&marker)?;

        Ok(())
    }

    fn write_page(&self, record: &PageRecord) -> OutputResult<PathBuf> {
        write_artifact(&self.content_dir, record)
    }

    fn write_snapshot(&self, result: &CrawlResult) -> OutputResult<()> {
        fs::create_dir_all(&self.snapshot_dir)?;
        write_listing(&self.visited_path(), &result.visited)?;
        write_listing(&self.pending_path(), &result.pending)?;
        write_listing(&self.file_urls_path(), &result.file_urls)?;

        tracing::info!(
            "Wrote snapshot: {} visited, {} pending, {} file URLs",
            result.visited.len(),
            result.pending.len(),
            result.file_urls.len()
        );
        Ok(())
    }
}
