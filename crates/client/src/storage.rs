//! Object storage collaborator used by run-from-package deployments.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use crate::error::ClientError;

/// Blob container operations.
pub trait BlobStorage: Send + Sync {
    /// Creates the container if it does not exist.
    fn ensure_container<'a>(&'a self, container: &'a str) -> BoxFuture<'a, Result<(), ClientError>>;

    /// Uploads a local file as a block blob.
    fn upload_file<'a>(
        &'a self,
        container: &'a str,
        blob_name: &'a str,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<(), ClientError>>;

    /// Builds a read-only shared-access URL valid from `start` to `expiry`.
    fn read_sas_url(
        &self,
        container: &str,
        blob_name: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<String, ClientError>;
}

/// Opens a [`BlobStorage`] for a parsed connection string.
pub trait BlobStorageFactory: Send + Sync {
    fn connect(
        &self,
        connection: &StorageConnectionString,
    ) -> Result<Arc<dyn BlobStorage>, ClientError>;
}

/// A storage account connection string
/// (`DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=..`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConnectionString {
    pub protocol: String,
    pub account_name: String,
    pub account_key: String,
    pub endpoint_suffix: String,
}

impl StorageConnectionString {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys are base64 and may themselves end in '='.
            let (key, value) = part.split_once('=').ok_or_else(|| {
                ClientError::InvalidConnectionString(format!("segment without '=': {part}"))
            })?;
            match key.to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(value.to_string()),
                "accountname" => account_name = Some(value.to_string()),
                "accountkey" => account_key = Some(value.to_string()),
                "endpointsuffix" => endpoint_suffix = Some(value.to_string()),
                _ => {}
            }
        }

        let account_name = account_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::InvalidConnectionString("missing AccountName".into()))?;
        let account_key = account_key
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::InvalidConnectionString("missing AccountKey".into()))?;

        Ok(Self {
            protocol: protocol.unwrap_or_else(|| "https".into()),
            account_name,
            account_key,
            endpoint_suffix: endpoint_suffix.unwrap_or_else(|| "core.windows.net".into()),
        })
    }

    /// Blob service endpoint, e.g. `https://acct.blob.core.windows.net`.
    pub fn blob_endpoint(&self) -> String {
        format!(
            "{}://{}.blob.{}",
            self.protocol, self.account_name, self.endpoint_suffix
        )
    }
}
