//! Blob service client authenticated with an account key.
//!
//! Requests are signed with the Shared Key scheme and read URLs carry a
//! service SAS, both HMAC-SHA256 over the account key.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::BoxFuture;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;
use tracing::debug;

use crate::error::{ClientError, ensure_success};
use crate::storage::{BlobStorage, BlobStorageFactory, StorageConnectionString};

/// REST version sent with every request.
const BLOB_API_VERSION: &str = "2019-12-12";
/// Version of the SAS string-to-sign layout.
const SAS_VERSION: &str = "2018-11-09";

/// Everything except unreserved characters and `/`.
const BLOB_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

type HmacSha256 = Hmac<Sha256>;

/// Blob client for one storage account.
pub struct BlobClient {
    http: reqwest::Client,
    base_url: String,
    account: String,
    key: Vec<u8>,
}

impl BlobClient {
    pub fn new(connection: &StorageConnectionString) -> Result<Self, ClientError> {
        let key = BASE64.decode(connection.account_key.as_bytes()).map_err(|e| {
            ClientError::InvalidConnectionString(format!("account key is not base64: {e}"))
        })?;
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: connection.blob_endpoint(),
            account: connection.account_name.clone(),
            key,
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn sign(&self, payload: &str) -> Result<String, ClientError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| ClientError::InvalidCredentials(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// `Authorization` header value for a request.
    ///
    /// `ms_headers` must hold every `x-ms-*` header sent, lowercase.
    fn authorization(
        &self,
        method: &str,
        content_length: u64,
        content_type: &str,
        ms_headers: &[(&str, &str)],
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<String, ClientError> {
        let length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };

        let mut headers = ms_headers.to_vec();
        headers.sort_by(|a, b| a.0.cmp(b.0));
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{k}:{v}\n"))
            .collect();

        let mut canonical_resource = format!("/{}/{}", self.account, resource);
        let mut params = query.to_vec();
        params.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in params {
            canonical_resource.push_str(&format!("\n{}:{}", k.to_ascii_lowercase(), v));
        }

        let string_to_sign = format!(
            "{method}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
        );
        Ok(format!("SharedKey {}:{}", self.account, self.sign(&string_to_sign)?))
    }

    async fn create_container(&self, container: &str) -> Result<(), ClientError> {
        let date = http_date(Utc::now());
        let auth = self.authorization(
            "PUT",
            0,
            "",
            &[("x-ms-date", &date), ("x-ms-version", BLOB_API_VERSION)],
            container,
            &[("restype", "container")],
        )?;
        let resp = self
            .http
            .put(format!("{}/{}", self.base_url, encode_path(container)))
            .query(&[("restype", "container")])
            .header("x-ms-date", &date)
            .header("x-ms-version", BLOB_API_VERSION)
            .header("Authorization", auth)
            .header("Content-Length", "0")
            .send()
            .await?;

        // Already there is fine.
        if resp.status() == reqwest::StatusCode::CONFLICT {
            debug!(container, "container exists");
            return Ok(());
        }
        ensure_success(resp).await?;
        debug!(container, "container created");
        Ok(())
    }

    async fn put_blob(&self, container: &str, blob_name: &str, path: &Path) -> Result<(), ClientError> {
        let data = tokio::fs::read(path).await?;
        let date = http_date(Utc::now());
        let content_type = "application/zip";
        let auth = self.authorization(
            "PUT",
            data.len() as u64,
            content_type,
            &[
                ("x-ms-blob-type", "BlockBlob"),
                ("x-ms-date", &date),
                ("x-ms-version", BLOB_API_VERSION),
            ],
            &format!("{container}/{blob_name}"),
            &[],
        )?;
        debug!(container, blob = blob_name, bytes = data.len(), "uploading blob");

        let url = format!(
            "{}/{}/{}",
            self.base_url,
            encode_path(container),
            encode_path(blob_name)
        );
        let resp = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-date", &date)
            .header("x-ms-version", BLOB_API_VERSION)
            .header("Content-Type", content_type)
            .header("Authorization", auth)
            .body(data)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

impl BlobStorage for BlobClient {
    fn ensure_container<'a>(&'a self, container: &'a str) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(self.create_container(container))
    }

    fn upload_file<'a>(
        &'a self,
        container: &'a str,
        blob_name: &'a str,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(self.put_blob(container, blob_name, path))
    }

    fn read_sas_url(
        &self,
        container: &str,
        blob_name: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<String, ClientError> {
        let start = sas_time(start);
        let expiry = sas_time(expiry);
        let canonical = format!("/blob/{}/{}/{}", self.account, container, blob_name);
        // sp st se resource si sip spr sv sr snapshot rscc rscd rsce rscl rsct
        let string_to_sign = format!(
            "r\n{start}\n{expiry}\n{canonical}\n\n\nhttps\n{SAS_VERSION}\nb\n\n\n\n\n\n"
        );
        let signature = self.sign(&string_to_sign)?;

        let query = [
            ("sv", SAS_VERSION),
            ("sr", "b"),
            ("sp", "r"),
            ("st", start.as_str()),
            ("se", expiry.as_str()),
            ("spr", "https"),
            ("sig", signature.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&");

        Ok(format!(
            "{}/{}/{}?{query}",
            self.base_url,
            encode_path(container),
            encode_path(blob_name)
        ))
    }
}

/// Opens [`BlobClient`]s.
#[derive(Debug, Clone, Default)]
pub struct SharedKeyBlobFactory;

impl BlobStorageFactory for SharedKeyBlobFactory {
    fn connect(
        &self,
        connection: &StorageConnectionString,
    ) -> Result<Arc<dyn BlobStorage>, ClientError> {
        Ok(Arc::new(BlobClient::new(connection)?))
    }
}

fn encode_path(segment: &str) -> String {
    utf8_percent_encode(segment, BLOB_PATH).to_string()
}

/// RFC 1123 date for the `x-ms-date` header.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn sas_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
