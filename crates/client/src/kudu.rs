//! Deployment service (Kudu) collaborator and client.

use std::path::Path;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{ClientError, ensure_success};
use crate::types::{DeployResult, PublishingCredentials};

/// Deployment id that always resolves to the most recent deployment.
pub const LATEST_DEPLOYMENT: &str = "latest";

/// Remote build/deploy service of a site.
pub trait DeploymentService: Send + Sync {
    /// Pushes a zip package. With `is_async` the call returns once the
    /// package is accepted and progress must be polled.
    fn zip_push_deploy<'a>(
        &'a self,
        zip_path: &'a Path,
        is_async: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>>;

    /// Looks up a deployment by id (or [`LATEST_DEPLOYMENT`]).
    fn deploy_result<'a>(&'a self, id: &'a str)
    -> BoxFuture<'a, Result<DeployResult, ClientError>>;
}

/// Opens a [`DeploymentService`] for a site's deployment host.
pub trait DeploymentServiceFactory: Send + Sync {
    fn connect(
        &self,
        scm_host: &str,
        credentials: &PublishingCredentials,
    ) -> Result<Arc<dyn DeploymentService>, ClientError>;
}

/// Opens [`KuduClient`]s.
#[derive(Debug, Clone, Default)]
pub struct KuduConnector;

impl DeploymentServiceFactory for KuduConnector {
    fn connect(
        &self,
        scm_host: &str,
        credentials: &PublishingCredentials,
    ) -> Result<Arc<dyn DeploymentService>, ClientError> {
        Ok(Arc::new(KuduClient::new(scm_host, credentials)?))
    }
}

/// HTTP client for the deployment endpoint, authenticated with the
/// site's publishing credentials.
pub struct KuduClient {
    http: reqwest::Client,
    base_url: String,
    user_name: String,
    password: String,
}

impl KuduClient {
    /// Creates a client for `https://{scm_host}`.
    pub fn new(scm_host: &str, credentials: &PublishingCredentials) -> Result<Self, ClientError> {
        if credentials.publishing_user_name.is_empty() {
            return Err(ClientError::InvalidCredentials(
                "publishing user name is empty".into(),
            ));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: format!("https://{scm_host}"),
            user_name: credentials.publishing_user_name.clone(),
            password: credentials.publishing_password.clone(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn push(&self, zip_path: &Path, is_async: bool) -> Result<(), ClientError> {
        let data = tokio::fs::read(zip_path).await?;
        debug!(path = %zip_path.display(), bytes = data.len(), "pushing zip package");

        let url = format!("{}/api/zipdeploy", self.base_url);
        let resp = self
            .http
            .post(&url)
            .query(&[("isAsync", is_async)])
            .basic_auth(&self.user_name, Some(&self.password))
            .header(CONTENT_TYPE, "application/zip")
            .body(data)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn fetch_result(&self, id: &str) -> Result<DeployResult, ClientError> {
        let encoded = utf8_percent_encode(id, NON_ALPHANUMERIC).to_string();
        let url = format!("{}/api/deployments/{encoded}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.user_name, Some(&self.password))
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        // Parsed from bytes: the content type is not reliable here.
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl DeploymentService for KuduClient {
    fn zip_push_deploy<'a>(
        &'a self,
        zip_path: &'a Path,
        is_async: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(self.push(zip_path, is_async))
    }

    fn deploy_result<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<DeployResult, ClientError>> {
        Box::pin(self.fetch_result(id))
    }
}
