//! Site-Harvester: a single-domain content crawler
//!
//! This crate crawls one website breadth-first from a seed URL, extracts the
//! visible text of every reachable page and writes it as JSON artifacts ready
//! for a downstream search indexer. Pages that only render client-side are
//! fetched through a headless browser fallback.

pub mod config;
pub mod crawler;
pub mod output;
pub mod publish;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Browser session error: {0}")]
    Resource(String),

    #[error("Artifact storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

// Re-export commonly used types
pub use config::Config;
pub use state::{CrawlResult, PageRecord, RunStatus};
pub use crate::url::{classify_url, extract_domain, strip_fragment, Target, UrlKind};
