//! Storage account credentials
//!
//! Parses storage connection strings as found in `AzureWebJobsStorage` and
//! signs blob requests with the SharedKey scheme when the connection string
//! carries an account key.

use crate::publish::PublishError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use url::Url;

/// Blob service REST version sent with every request
pub const STORAGE_API_VERSION: &str = "2021-08-06";

// Well-known local storage emulator account
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// How blob requests are authorized
#[derive(Debug, Clone)]
pub enum BlobAuth {
    /// Requests are signed with the account key
    SharedKey(SharedKeyCredential),
    /// A SAS token is appended to every URL
    Sas(String),
}

/// A storage account resolved from a connection string
#[derive(Debug, Clone)]
pub struct StorageAccount {
    blob_endpoint: Url,
    auth: BlobAuth,
}

impl StorageAccount {
    /// Parses a `Key=Value;Key=Value` connection string
    ///
    /// | Key | Use |
    /// |-----|-----|
    /// | `AccountName`, `AccountKey` | SharedKey signing |
    /// | `SharedAccessSignature` | SAS token, used when there is no key |
    /// | `BlobEndpoint` | Explicit endpoint |
    /// | `DefaultEndpointsProtocol`, `EndpointSuffix` | Endpoint `<protocol>://<account>.blob.<suffix>` otherwise |
    /// | `UseDevelopmentStorage=true` | Local storage emulator |
    ///
    /// Keys are case-insensitive. Error messages never include the key or
    /// the signature.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, PublishError> {
        let mut fields = HashMap::new();
        for segment in connection_string
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                PublishError::InvalidConnectionString("segment without '='".to_string())
            })?;
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if fields
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Self::development();
        }

        let account = fields.get("accountname");
        let blob_endpoint = match fields.get("blobendpoint") {
            Some(endpoint) => endpoint.clone(),
            None => {
                let account = account.ok_or_else(|| {
                    PublishError::InvalidConnectionString(
                        "AccountName or BlobEndpoint is required".to_string(),
                    )
                })?;
                let protocol = fields
                    .get("defaultendpointsprotocol")
                    .map_or("https", String::as_str);
                let suffix = fields
                    .get("endpointsuffix")
                    .map_or("core.windows.net", String::as_str);
                format!("{}://{}.blob.{}", protocol, account, suffix)
            }
        };
        let blob_endpoint = Url::parse(&blob_endpoint).map_err(|e| {
            PublishError::InvalidConnectionString(format!("invalid blob endpoint: {}", e))
        })?;
        if !matches!(blob_endpoint.scheme(), "http" | "https") || blob_endpoint.cannot_be_a_base()
        {
            return Err(PublishError::InvalidConnectionString(format!(
                "blob endpoint must be http(s), got '{}'",
                blob_endpoint.scheme()
            )));
        }

        let auth = match (account, fields.get("accountkey"), fields.get("sharedaccesssignature")) {
            (Some(account), Some(key), _) => {
                BlobAuth::SharedKey(SharedKeyCredential::new(account.clone(), key)?)
            }
            (_, _, Some(sas)) => BlobAuth::Sas(sas.trim_start_matches('?').to_string()),
            _ => {
                return Err(PublishError::InvalidConnectionString(
                    "needs AccountName and AccountKey, or SharedAccessSignature".to_string(),
                ))
            }
        };

        Ok(Self {
            blob_endpoint,
            auth,
        })
    }

    fn development() -> Result<Self, PublishError> {
        let blob_endpoint = Url::parse(DEV_BLOB_ENDPOINT)
            .map_err(|e| PublishError::InvalidConnectionString(e.to_string()))?;
        Ok(Self {
            blob_endpoint,
            auth: BlobAuth::SharedKey(SharedKeyCredential::new(
                DEV_ACCOUNT_NAME,
                DEV_ACCOUNT_KEY,
            )?),
        })
    }

    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    pub fn auth(&self) -> &BlobAuth {
        &self.auth
    }

    /// URL of `container` on this account, carrying the SAS token if any
    pub fn container_url(&self, container: &str) -> Url {
        let mut url = self.blob_endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.push(container);
        }
        if let BlobAuth::Sas(sas) = &self.auth {
            url.set_query(Some(sas));
        }
        url
    }
}

/// Account name plus key, used to sign requests
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    mac: Hmac<Sha256>,
}

impl fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyCredential {
    /// Creates a credential from an account name and its base64 key
    pub fn new(account: impl Into<String>, key_base64: &str) -> Result<Self, PublishError> {
        let key = STANDARD.decode(key_base64.trim()).map_err(|_| {
            PublishError::InvalidConnectionString("AccountKey is not valid base64".to_string())
        })?;
        let mac = Hmac::<Sha256>::new_from_slice(&key).map_err(|_| {
            PublishError::InvalidConnectionString("AccountKey is empty".to_string())
        })?;

        Ok(Self {
            account: account.into(),
            mac,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Builds the canonical string signed for a request
    ///
    /// `ms_headers` holds the `x-ms-*` headers, lowercase. A zero content
    /// length is left empty.
    pub fn string_to_sign(
        &self,
        method: &str,
        url: &Url,
        content_length: usize,
        content_type: &str,
        ms_headers: &BTreeMap<String, String>,
    ) -> String {
        let content_length = match content_length {
            0 => String::new(),
            n => n.to_string(),
        };

        // Encoding, language, length, MD5, type, date, four conditionals, range
        let mut canonical = format!(
            "{}\n\n\n{}\n\n{}\n\n\n\n\n\n\n",
            method, content_length, content_type
        );

        for (name, value) in ms_headers {
            canonical.push_str(&format!("{}:{}\n", name, value.trim()));
        }

        canonical.push('/');
        canonical.push_str(&self.account);
        canonical.push_str(url.path());

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            params
                .entry(name.to_lowercase())
                .or_default()
                .push(value.into_owned());
        }
        for (name, mut values) in params {
            values.sort();
            canonical.push_str(&format!("\n{}:{}", name, values.join(",")));
        }

        canonical
    }

    /// Value of the `Authorization` header for a request
    pub fn authorization(
        &self,
        method: &str,
        url: &Url,
        content_length: usize,
        content_type: &str,
        ms_headers: &BTreeMap<String, String>,
    ) -> String {
        let canonical = self.string_to_sign(method, url, content_length, content_type, ms_headers);
        let mut mac = self.mac.clone();
        mac.update(canonical.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        format!("SharedKey {}:{}", self.account, signature)
    }
}

/// Current time in the RFC 1123 form used by `x-ms-date`
pub fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
