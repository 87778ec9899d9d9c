use crate::config::types::{BrowserMode, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Parses a configuration file without validating it
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Seed: {}", config.crawler.target_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = parse_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at start-up so runs can be matched to the configuration they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Applies environment overrides on top of a parsed configuration
///
/// `lookup` returns the value of a variable, or `None` when unset. Empty
/// values count as unset.
///
/// | Variable | Key |
/// |----------|-----|
/// | `TARGET_URL` | `crawler.target-url` |
/// | `POLITENESS_DELAY_MS` | `crawler.politeness-delay` |
/// | `MAX_PAGES` | `crawler.max-pages` |
/// | `BROWSER_MODE` | `browser.mode` |
/// | `BLOB_CONTAINER_URL` | `publish.container-url` |
/// | `AzureWebJobsStorage` | `publish.connection-string` |
/// | `BLOB_CONTAINER_NAME` | `publish.container` |
/// | `SEARCH_SERVICE_NAME` | `publish.search-service` |
/// | `INDEXER_NAME` | `publish.indexer-name` |
/// | `SEARCH_ADMIN_KEY` | `publish.search-api-key` |
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("TARGET_URL") {
        config.crawler.target_url = url;
    }
    if let Some(delay) = get("POLITENESS_DELAY_MS") {
        config.crawler.politeness_delay = parse_env("POLITENESS_DELAY_MS", &delay)?;
    }
    if let Some(max) = get("MAX_PAGES") {
        config.crawler.max_pages = Some(parse_env("MAX_PAGES", &max)?);
    }
    if let Some(mode) = get("BROWSER_MODE") {
        config.browser.mode = match mode.to_ascii_lowercase().as_str() {
            "required" => BrowserMode::Required,
            "auto" => BrowserMode::Auto,
            "disabled" => BrowserMode::Disabled,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    key: "BROWSER_MODE".to_string(),
                    value: mode,
                })
            }
        };
    }
    if let Some(url) = get("BLOB_CONTAINER_URL") {
        config.publish.container_url = Some(url);
    }
    if let Some(connection_string) = get("AzureWebJobsStorage") {
        config.publish.connection_string = Some(connection_string);
    }
    if let Some(container) = get("BLOB_CONTAINER_NAME") {
        config.publish.container = container;
    }
    if let Some(service) = get("SEARCH_SERVICE_NAME") {
        config.publish.search_service = Some(service);
    }
    if let Some(name) = get("INDEXER_NAME") {
        config.publish.indexer_name = Some(name);
    }
    if let Some(key) = get("SEARCH_ADMIN_KEY") {
        config.publish.search_api_key = Some(key);
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Resolves the effective configuration for a run
///
/// Reads the file if given (defaults otherwise), applies the process
/// environment, then validates. Returns the file hash when a file was read.
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => (parse_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok((config, hash))
}
