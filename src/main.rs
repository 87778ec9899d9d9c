//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester content crawler.

use anyhow::Context;
use clap::Parser;
use site_harvester::config::{resolve_config, validate, Config};
use site_harvester::crawler::run_crawl;
use site_harvester::output::{print_statistics, CrawlStatistics};
use site_harvester::publish::publish;
use site_harvester::RunStatus;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Harvester: a single-domain content crawler
///
/// Site-Harvester crawls one website breadth-first from a seed URL, writes
/// the visible text of every page as JSON, and optionally uploads the
/// results and triggers a search indexer.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "A single-domain content crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults and environment if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL, overriding the config file and TARGET_URL
    #[arg(long, value_name = "URL")]
    target: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Do not upload artifacts or trigger the indexer after the crawl
    #[arg(long)]
    skip_publish: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // Load and validate configuration
    let (mut config, config_hash) = resolve_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No config file given, using defaults and environment"),
    }

    if let Some(target) = cli.target {
        config.crawler.target_url = target;
        validate(&config).context("Invalid --target")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.skip_publish).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Target URL: {}", config.crawler.target_url);
    println!(
        "  Politeness delay: {}ms",
        config.crawler.politeness_delay
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!("  Max pages: {}", display_limit(config.crawler.max_pages));
    println!("  Max depth: {}", display_limit(config.crawler.max_depth));

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nBrowser:");
    println!("  Mode: {:?}", config.browser.mode);
    println!("  Settle time: {}ms", config.browser.settle_time);
    if let Some(chrome) = &config.browser.chrome_executable {
        println!("  Executable: {}", chrome.display());
    }

    println!("\nOutput:");
    println!("  Content directory: {}", config.output.content_dir);
    println!(
        "  Snapshots: {}/{{{}, {}, {}}}",
        config.output.snapshot_dir,
        config.output.visited_file,
        config.output.pending_file,
        config.output.file_urls_file
    );

    println!("\nPublish:");
    match (&config.publish.container_url, &config.publish.connection_string) {
        (Some(_), _) => println!("  Blob upload: container URL"),
        (None, Some(_)) => println!(
            "  Blob upload: connection string, container '{}'",
            config.publish.container
        ),
        (None, None) => println!("  Blob upload: disabled"),
    }
    match (
        config.publish.resolved_search_endpoint(),
        &config.publish.indexer_name,
    ) {
        (Some(endpoint), Some(indexer)) => {
            println!("  Indexer: {} at {}", indexer, endpoint);
            if config.publish.search_api_key.is_none() {
                println!("  (no API key set, trigger will be skipped)");
            }
        }
        _ => println!("  Indexer: disabled"),
    }

    println!("\n✓ Configuration is valid");
}

fn display_limit<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}

/// Handles the main crawl operation followed by publishing
async fn handle_crawl(config: Config, skip_publish: bool) -> anyhow::Result<()> {
    tracing::info!("Starting crawl for: {}", config.crawler.target_url);

    let result = run_crawl(config.clone()).await.context("Crawl aborted")?;

    let stats = CrawlStatistics::from_result(&result);
    if !result.unsaved.is_empty() {
        tracing::error!(
            "{} pages were fetched but their content was not saved",
            result.unsaved.len()
        );
    }

    if !result.status.is_complete() {
        tracing::warn!(
            "Crawl {} with {} URLs still pending",
            result.status,
            result.pending.len()
        );
    }

    if result.status == RunStatus::Interrupted {
        print_statistics(&stats);
        anyhow::bail!("Crawl interrupted, skipping publish");
    }

    if skip_publish {
        tracing::info!("Skipping publish (--skip-publish)");
    } else {
        let report = publish(&config).await.context("Publishing failed")?;
        if let Some(count) = report.uploaded {
            tracing::info!("Published {} artifacts", count);
        }
    }

    print_statistics(&stats);
    Ok(())
}
