//! Search indexer trigger

use crate::config::PublishConfig;
use crate::publish::PublishError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

/// Requests an asynchronous run of a search indexer
pub struct IndexerTrigger {
    client: Client,
    endpoint: String,
    indexer_name: String,
    api_key: String,
    api_version: String,
}

impl IndexerTrigger {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        indexer_name: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            indexer_name: indexer_name.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }

    /// Builds a trigger from the `[publish]` section
    ///
    /// Returns `None` unless an endpoint (or service name), an indexer name
    /// and an API key are all present.
    pub fn from_config(client: Client, config: &PublishConfig) -> Option<Self> {
        let endpoint = config.resolved_search_endpoint()?;
        let indexer_name = config.indexer_name.as_ref()?;
        let api_key = config.search_api_key.as_ref()?;

        Some(Self::new(
            client,
            endpoint,
            indexer_name,
            api_key,
            &config.api_version,
        ))
    }

    /// `<endpoint>/indexers/<name>/run?api-version=<version>`
    pub fn run_url(&self) -> String {
        format!(
            "{}/indexers/{}/run?api-version={}",
            self.endpoint, self.indexer_name, self.api_version
        )
    }

    /// Triggers the indexer; `202 Accepted` is the only success
    pub async fn trigger(&self) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.run_url())
            .header("api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            tracing::info!("Indexer {} triggered", self.indexer_name);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            "Indexer {} rejected run request: HTTP {} {}",
            self.indexer_name,
            status.as_u16(),
            body
        );
        Err(PublishError::Indexer {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publish_config(endpoint: &str) -> PublishConfig {
        PublishConfig {
            search_endpoint: Some(endpoint.to_string()),
            indexer_name: Some("site-indexer".to_string()),
            search_api_key: Some("secret".to_string()),
            ..PublishConfig::default()
        }
    }

    #[test]
    fn test_run_url_from_service_name() {
        let config = PublishConfig {
            search_service: Some("mysearch".to_string()),
            indexer_name: Some("site-indexer".to_string()),
            search_api_key: Some("secret".to_string()),
            ..PublishConfig::default()
        };
        let trigger = IndexerTrigger::from_config(Client::new(), &config).unwrap();
        assert_eq!(
            trigger.run_url(),
            "https://mysearch.search.windows.net/indexers/site-indexer/run?api-version=2023-10-01"
        );
    }

    #[test]
    fn test_not_configured() {
        assert!(IndexerTrigger::from_config(Client::new(), &PublishConfig::default()).is_none());

        let mut config = publish_config("https://search.example.net");
        config.search_api_key = None;
        assert!(IndexerTrigger::from_config(Client::new(), &config).is_none());
    }

    #[tokio::test]
    async fn test_trigger_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexers/site-indexer/run"))
            .and(query_param("api-version", "2023-10-01"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let trigger =
            IndexerTrigger::from_config(Client::new(), &publish_config(&server.uri())).unwrap();
        trigger.trigger().await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok?"))
            .mount(&server)
            .await;

        let trigger =
            IndexerTrigger::from_config(Client::new(), &publish_config(&server.uri())).unwrap();
        match trigger.trigger().await.unwrap_err() {
            PublishError::Indexer { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, "ok?");
            }
            other => panic!("expected indexer error, got {:?}", other),
        }
    }
}
