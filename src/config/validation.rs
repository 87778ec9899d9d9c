use crate::config::types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, PublishConfig, UserAgentConfig};
use crate::publish::StorageAccount;
use crate::ConfigError;
use url::Url;

/// Upper bound for the politeness delay and browser settle time (milliseconds)
const MAX_WAIT_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    validate_publish_config(&config.publish)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.target_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid target URL '{}': {}", config.target_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Target URL '{}' must use HTTP or HTTPS",
            config.target_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "Target URL '{}' has no host",
            config.target_url
        )));
    }

    if config.request_timeout < 1000 || config.request_timeout > 300_000 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be between 1000 and 300000ms, got {}ms",
            config.request_timeout
        )));
    }

    if config.politeness_delay > MAX_WAIT_MS {
        return Err(ConfigError::Validation(format!(
            "politeness_delay must be <= {}ms, got {}ms",
            MAX_WAIT_MS, config.politeness_delay
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.max_depth == Some(0) {
        return Err(ConfigError::Validation(
            "max_depth must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.settle_time > MAX_WAIT_MS {
        return Err(ConfigError::Validation(format!(
            "settle_time must be <= {}ms, got {}ms",
            MAX_WAIT_MS, config.settle_time
        )));
    }

    if config.navigation_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout must be >= 1000ms, got {}ms",
            config.navigation_timeout
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let fields = [
        ("content_dir", &config.content_dir),
        ("snapshot_dir", &config.snapshot_dir),
        ("visited_file", &config.visited_file),
        ("pending_file", &config.pending_file),
        ("file_urls_file", &config.file_urls_file),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    let listings = [
        &config.visited_file,
        &config.pending_file,
        &config.file_urls_file,
    ];
    for (i, a) in listings.iter().enumerate() {
        if listings[i + 1..].contains(a) {
            return Err(ConfigError::Validation(format!(
                "snapshot listings must have distinct file names, '{}' is repeated",
                a
            )));
        }
    }

    Ok(())
}

/// Validates publish configuration
fn validate_publish_config(config: &PublishConfig) -> Result<(), ConfigError> {
    if let Some(container) = &config.container_url {
        let url = Url::parse(container)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid container_url: {}", e)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "container_url must use HTTP or HTTPS, got '{}'",
                url.scheme()
            )));
        }
    }

    if let Some(connection_string) = &config.connection_string {
        StorageAccount::from_connection_string(connection_string)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
    }

    // Container names: 3-63 lowercase letters, digits and single hyphens
    let name = &config.container;
    let valid_container = (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if !valid_container {
        return Err(ConfigError::Validation(format!(
            "container must be 3-63 lowercase letters, digits or hyphens, got '{}'",
            name
        )));
    }

    if let Some(endpoint) = &config.search_endpoint {
        Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search_endpoint: {}", e)))?;
    }

    if let Some(service) = &config.search_service {
        if !service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "search_service must be a bare service name, got '{}'",
                service
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_target_url_rules() {
        let mut config = Config::default();

        config.crawler.target_url = "http://localhost:8080/".to_string();
        assert!(validate(&config).is_ok());

        config.crawler.target_url = "ftp://example.com/".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));

        config.crawler.target_url = "example.com".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_timeouts_bounded() {
        let mut config = Config::default();
        config.crawler.request_timeout = 999;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.politeness_delay = 60_001;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.browser.settle_time = 120_000;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.politeness_delay = 0;
        config.browser.settle_time = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_limits_must_be_positive() {
        let mut config = Config::default();
        config.crawler.max_pages = Some(0);
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.max_depth = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "good-name".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_snapshot_names_distinct() {
        let mut config = Config::default();
        config.output.pending_file = config.output.visited_file.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_search_service_name() {
        let mut config = Config::default();
        config.publish.search_service = Some("my-search".to_string());
        assert!(validate(&config).is_ok());

        config.publish.search_service = Some("https://my-search.net".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_container_name() {
        let mut config = Config::default();
        assert_eq!(config.publish.container, "webcontent");

        for valid in ["abc", "web-content", "pages2026"] {
            config.publish.container = valid.to_string();
            assert!(validate(&config).is_ok(), "{}", valid);
        }
        for invalid in ["ab", "WebContent", "-pages", "pages-", "we--b", "web_content"] {
            config.publish.container = invalid.to_string();
            assert!(validate(&config).is_err(), "{}", invalid);
        }
    }

    #[test]
    fn test_connection_string_checked_early() {
        let mut config = Config::default();
        config.publish.connection_string = Some("UseDevelopmentStorage=true".to_string());
        assert!(validate(&config).is_ok());

        config.publish.connection_string = Some("AccountName=acct;AccountKey=s3cret!".to_string());
        let err = validate(&config).unwrap_err();
        assert!(!err.to_string().contains("s3cret"));
    }
}
