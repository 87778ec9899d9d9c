//! Downstream publishing of crawl artifacts
//!
//! After a crawl terminates, the artifact directory can be pushed to a blob
//! container and a search indexer asked to re-index it. Both steps are
//! optional and only run when configured.

mod blob;
mod credentials;
mod indexer;

pub use blob::{collect_artifacts, BlobUploader};
pub use credentials::{BlobAuth, SharedKeyCredential, StorageAccount, STORAGE_API_VERSION};
pub use indexer::IndexerTrigger;

use crate::config::{Config, PublishConfig};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a single upload or trigger request
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while publishing artifacts
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid container URL: {0}")]
    InvalidContainerUrl(String),

    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Failed to upload {blob}: HTTP {status} {body}")]
    Upload {
        blob: String,
        status: u16,
        body: String,
    },

    #[error("{failed} of {total} artifacts failed to upload")]
    Incomplete { failed: usize, total: usize },

    #[error("Failed to run indexer: HTTP {status} {body}")]
    Indexer { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a publish pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Artifacts uploaded, or `None` if no container is configured
    pub uploaded: Option<usize>,

    /// True if the indexer accepted a run request
    pub indexer_triggered: bool,
}

/// Builds the HTTP client used for publishing
pub fn build_publish_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(PUBLISH_TIMEOUT)
        .build()
}

/// Uploader for the configured destination, if any
///
/// An explicit `container-url` wins over a connection string.
pub fn configured_uploader(
    client: Client,
    config: &PublishConfig,
) -> Result<Option<BlobUploader>, PublishError> {
    if let Some(container_url) = &config.container_url {
        return BlobUploader::new(client, container_url).map(Some);
    }

    match &config.connection_string {
        Some(connection_string) => {
            let account = StorageAccount::from_connection_string(connection_string)?;
            Ok(Some(BlobUploader::for_account(
                client,
                &account,
                &config.container,
            )))
        }
        None => Ok(None),
    }
}

/// Uploads the artifact directory and triggers the indexer, as configured
///
/// The indexer is not triggered if the upload failed.
pub async fn publish(config: &Config) -> Result<PublishReport, PublishError> {
    let client = build_publish_client(config)?;
    let mut report = PublishReport::default();

    match configured_uploader(client.clone(), &config.publish)? {
        Some(uploader) => {
            let count = uploader
                .upload_dir(Path::new(&config.output.content_dir))
                .await?;
            report.uploaded = Some(count);
        }
        None => tracing::info!("No blob container configured, skipping upload"),
    }

    match IndexerTrigger::from_config(client, &config.publish) {
        Some(trigger) => {
            trigger.trigger().await?;
            report.indexer_triggered = true;
        }
        None => tracing::info!("Search indexer not configured, skipping trigger"),
    }

    Ok(report)
}
