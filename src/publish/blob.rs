//! Blob container upload
//!
//! Artifacts are PUT to `<container>/<relative path>` as block blobs. The
//! container URL either carries a SAS token in its query string or every
//! request is signed with the account key.

use crate::publish::credentials::{http_date, BlobAuth, SharedKeyCredential, StorageAccount};
use crate::publish::{PublishError, STORAGE_API_VERSION};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use url::Url;

const ARTIFACT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Uploads artifact files to a blob container
pub struct BlobUploader {
    client: Client,
    container: Url,
    credential: Option<SharedKeyCredential>,
}

impl BlobUploader {
    /// Creates an uploader for `container_url`
    ///
    /// The URL must be absolute http(s) and name the container in its path.
    pub fn new(client: Client, container_url: &str) -> Result<Self, PublishError> {
        let container = Url::parse(container_url)
            .map_err(|e| PublishError::InvalidContainerUrl(e.to_string()))?;

        if !matches!(container.scheme(), "http" | "https") || container.cannot_be_a_base() {
            return Err(PublishError::InvalidContainerUrl(redact(&container)));
        }
        if container.path().trim_matches('/').is_empty() {
            return Err(PublishError::InvalidContainerUrl(format!(
                "{} has no container name",
                redact(&container)
            )));
        }

        Ok(Self {
            client,
            container,
            credential: None,
        })
    }

    /// Creates an uploader for `container` on a storage account
    pub fn for_account(client: Client, account: &StorageAccount, container: &str) -> Self {
        let credential = match account.auth() {
            BlobAuth::SharedKey(credential) => Some(credential.clone()),
            BlobAuth::Sas(_) => None,
        };

        Self {
            client,
            container: account.container_url(container),
            credential,
        }
    }

    /// URL of the blob stored at `relative` inside the container
    ///
    /// Path components become URL path segments, so the blob name always uses
    /// forward slashes.
    pub fn blob_url(&self, relative: &Path) -> Url {
        let mut url = self.container.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for component in relative.components() {
                segments.push(&component.as_os_str().to_string_lossy());
            }
        }
        url
    }

    /// Asks the service to create the container
    ///
    /// Failure is logged and ignored: the container usually already exists.
    pub async fn ensure_container(&self) {
        let mut url = self.container.clone();
        url.query_pairs_mut().append_pair("restype", "container");

        match self.put(url, Vec::new(), None).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Created blob container {}", self.container.path());
            }
            Ok(response) => tracing::debug!(
                "Container create returned HTTP {}, assuming it exists",
                response.status().as_u16()
            ),
            Err(e) => tracing::debug!("Container create failed: {}", e),
        }
    }

    /// Uploads one artifact, overwriting any existing blob
    pub async fn upload_file(&self, root: &Path, relative: &Path) -> Result<(), PublishError> {
        let data = tokio::fs::read(root.join(relative)).await?;
        let url = self.blob_url(relative);

        let response = self.put(url, data, Some("BlockBlob")).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(PublishError::Upload {
            blob: blob_name(relative),
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    /// Builds a PUT with the storage headers, signed if a key is configured
    fn put(&self, url: Url, body: Vec<u8>, blob_type: Option<&str>) -> RequestBuilder {
        let content_type = if body.is_empty() {
            ""
        } else {
            ARTIFACT_CONTENT_TYPE
        };

        let mut ms_headers = BTreeMap::new();
        ms_headers.insert("x-ms-date".to_string(), http_date());
        ms_headers.insert("x-ms-version".to_string(), STORAGE_API_VERSION.to_string());
        if let Some(blob_type) = blob_type {
            ms_headers.insert("x-ms-blob-type".to_string(), blob_type.to_string());
        }

        let mut request = self.client.put(url.clone());
        if let Some(credential) = &self.credential {
            let authorization =
                credential.authorization("PUT", &url, body.len(), content_type, &ms_headers);
            request = request.header(AUTHORIZATION, authorization);
        }
        for (name, value) in &ms_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !content_type.is_empty() {
            request = request.header(CONTENT_TYPE, content_type);
        }

        request.body(body)
    }

    /// Uploads every `.json` file under `dir` and returns how many were sent
    ///
    /// Individual failures are logged and the remaining files still upload;
    /// the call fails with `Incomplete` if any file did not make it.
    pub async fn upload_dir(&self, dir: &Path) -> Result<usize, PublishError> {
        let artifacts = collect_artifacts(dir).await?;
        tracing::info!(
            "Uploading {} artifacts to {}",
            artifacts.len(),
            self.container.path()
        );

        self.ensure_container().await;

        let mut failed = 0usize;
        for relative in &artifacts {
            if let Err(e) = self.upload_file(dir, relative).await {
                tracing::error!("{}", e);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(PublishError::Incomplete {
                failed,
                total: artifacts.len(),
            });
        }

        tracing::info!("Uploaded {} artifacts", artifacts.len());
        Ok(artifacts.len())
    }
}

/// Lists `.json` files under `dir`, relative to it and sorted
pub async fn collect_artifacts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let mut entries = tokio::fs::read_dir(dir.join(&relative)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = relative.join(entry.file_name());

            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.extension() == Some(OsStr::new("json")) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn blob_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Container URL without its SAS token, for messages
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{
        body_string, header, header_exists, header_regex, method, path, query_param,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_rejects_invalid_container_urls() {
        let client = Client::new();
        assert!(BlobUploader::new(client.clone(), "not a url").is_err());
        assert!(BlobUploader::new(client.clone(), "ftp://acct.example.net/c").is_err());
        assert!(BlobUploader::new(client, "https://acct.example.net/?sig=x").is_err());
    }

    #[test]
    fn test_invalid_url_error_hides_token() {
        let err = BlobUploader::new(Client::new(), "https://acct.example.net/?sig=secret")
            .err()
            .unwrap();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_blob_url_keeps_sas_token() {
        let uploader = BlobUploader::new(
            Client::new(),
            "https://acct.blob.core.windows.net/webcontent?sv=2022&sig=abc",
        )
        .unwrap();
        let url = uploader.blob_url(&Path::new("about").join("team.json"));
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/webcontent/about/team.json?sv=2022&sig=abc"
        );
    }

    #[test]
    fn test_blob_url_with_trailing_slash() {
        let uploader =
            BlobUploader::new(Client::new(), "https://acct.example.net/webcontent/").unwrap();
        let url = uploader.blob_url(Path::new("index.json"));
        assert_eq!(url.path(), "/webcontent/index.json");
    }

    #[tokio::test]
    async fn test_collect_artifacts_only_json() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.json", "{}");
        write(dir.path(), "about/team.json", "{}");
        write(dir.path(), "about/deeper/page.json", "{}");
        write(dir.path(), "about/notes.txt", "x");

        let found = collect_artifacts(dir.path()).await.unwrap();
        assert_eq!(
            found,
            vec![
                Path::new("about").join("deeper").join("page.json"),
                Path::new("about").join("team.json"),
                PathBuf::from("index.json"),
            ]
        );
        assert_eq!(blob_name(&found[1]), "about/team.json");
    }

    #[tokio::test]
    async fn test_upload_dir() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/webcontent"))
            .and(query_param("restype", "container"))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/webcontent/about/team.json"))
            .and(query_param("sig", "abc"))
            .and(header("x-ms-blob-type", "BlockBlob"))
            .and(body_string(r#"{"url":"team"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/webcontent/index.json"))
            .and(header("x-ms-blob-type", "BlockBlob"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.json", r#"{"url":"index"}"#);
        write(dir.path(), "about/team.json", r#"{"url":"team"}"#);

        let uploader = BlobUploader::new(
            Client::new(),
            &format!("{}/webcontent?sv=2022&sig=abc", server.uri()),
        )
        .unwrap();
        assert_eq!(uploader.upload_dir(dir.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upload_failure_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/webcontent/index.json"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AuthenticationFailed"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.json", "{}");
        write(dir.path(), "a.json", "{}");

        let uploader =
            BlobUploader::new(Client::new(), &format!("{}/webcontent", server.uri())).unwrap();
        let err = uploader.upload_dir(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Incomplete {
                failed: 1,
                total: 2
            }
        ));

        let err = uploader
            .upload_file(dir.path(), Path::new("index.json"))
            .await
            .unwrap_err();
        match err {
            PublishError::Upload { blob, status, body } => {
                assert_eq!(blob, "index.json");
                assert_eq!(status, 403);
                assert_eq!(body, "AuthenticationFailed");
            }
            other => panic!("expected upload error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sas_requests_are_not_signed() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/webcontent/index.json"))
            .and(header("x-ms-version", STORAGE_API_VERSION))
            .and(header_exists("x-ms-date"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.json", "{}");

        let uploader = BlobUploader::new(
            Client::new(),
            &format!("{}/webcontent?sig=abc", server.uri()),
        )
        .unwrap();
        uploader
            .upload_file(dir.path(), Path::new("index.json"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_with_account_key_signs_requests() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/acct/webcontent"))
            .and(query_param("restype", "container"))
            .and(header_regex("authorization", "^SharedKey acct:[A-Za-z0-9+/=]+$"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/acct/webcontent/about/team.json"))
            .and(header("x-ms-blob-type", "BlockBlob"))
            .and(header("x-ms-version", STORAGE_API_VERSION))
            .and(header_exists("x-ms-date"))
            .and(header_regex("authorization", "^SharedKey acct:[A-Za-z0-9+/=]+$"))
            .and(body_string(r#"{"url":"team"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "about/team.json", r#"{"url":"team"}"#);

        let account = StorageAccount::from_connection_string(&format!(
            "DefaultEndpointsProtocol=http;AccountName=acct;AccountKey=bm90LWEtcmVhbC1rZXk=;BlobEndpoint={}/acct",
            server.uri()
        ))
        .unwrap();
        let uploader = BlobUploader::for_account(Client::new(), &account, "webcontent");
        assert_eq!(uploader.upload_dir(dir.path()).await.unwrap(), 1);
    }
}
