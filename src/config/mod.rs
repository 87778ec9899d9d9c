//! Configuration module for Site-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering environment variables on top of them.
//!
//! # Example
//!
//! ```no_run
//! use site_harvester::config::resolve_config;
//! use std::path::Path;
//!
//! let (config, _hash) = resolve_config(Some(Path::new("harvester.toml"))).unwrap();
//! println!("Crawling {}", config.crawler.target_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, BrowserMode, Config, CrawlerConfig, OutputConfig, PublishConfig,
    UserAgentConfig, DEFAULT_CONTAINER, DEFAULT_TARGET_URL,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, parse_config, resolve_config,
};
pub use validation::validate;
