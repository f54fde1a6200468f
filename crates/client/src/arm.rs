//! Resource manager REST client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use futures_util::future::BoxFuture;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ensure_success};
use crate::management::WebSiteManagement;
use crate::types::{
    AppServicePlan, Page, PublishingCredentials, Site, SiteConfig, SiteSourceControl,
    StringDictionary,
};

const DEFAULT_BASE_URL: &str = "https://management.azure.com";
const SITES_API_VERSION: &str = "2016-08-01";
const PLANS_API_VERSION: &str = "2016-09-01";

/// `{"properties": ..}` envelope used by configuration resources.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    properties: T,
}

/// Resource manager client scoped to one subscription.
pub struct ArmClient {
    http: reqwest::Client,
    base_url: String,
    subscription_id: String,
}

impl ArmClient {
    /// Creates a client with the given access token.
    pub fn new(subscription_id: &str, access_token: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .map_err(|_| ClientError::InvalidCredentials("malformed access token".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            subscription_id: subscription_id.to_string(),
        })
    }

    /// Overrides the management endpoint (sovereign clouds, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Sends a request to a resource path and decodes the JSON answer.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        self.call_url(method, &url, Some(api_version), query, body)
            .await
    }

    async fn call_url<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        api_version: Option<&str>,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        debug!(%method, url, "management request");
        let mut req = self.http.request(method, url);
        if let Some(version) = api_version {
            req = req.query(&[("api-version", version)]);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = ensure_success(req.send().await?).await?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            // Empty answers (DELETE, 204) decode as JSON null.
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn web_apps_page(&self, next_link: Option<&str>) -> Result<Page<Site>, ClientError> {
        match next_link {
            Some(link) => self.call_url(Method::GET, link, None, &[], None).await,
            None => {
                let path = format!(
                    "/subscriptions/{}/providers/Microsoft.Web/sites",
                    self.subscription_id
                );
                self.call(Method::GET, &path, SITES_API_VERSION, &[], None)
                    .await
            }
        }
    }

    async fn slots(&self, site: &Site) -> Result<Vec<Site>, ClientError> {
        let path = format!("{}/slots", site.id);
        let mut page: Page<Site> = self
            .call(Method::GET, &path, SITES_API_VERSION, &[], None)
            .await?;
        let mut slots = std::mem::take(&mut page.value);
        while let Some(link) = page.next_link.take() {
            page = self.call_url(Method::GET, &link, None, &[], None).await?;
            slots.append(&mut page.value);
        }
        Ok(slots)
    }

    async fn properties<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let envelope: Envelope<T> = self
            .call(method, &path, SITES_API_VERSION, &[], body)
            .await?;
        Ok(envelope.properties)
    }

    async fn put_properties<T: Serialize + DeserializeOwned>(
        &self,
        path: String,
        properties: &T,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(Envelope { properties })?;
        self.properties(Method::PUT, path, Some(body)).await
    }

    async fn plan(&self, plan_id: &str) -> Result<AppServicePlan, ClientError> {
        self.call(Method::GET, plan_id, PLANS_API_VERSION, &[], None)
            .await
    }

    async fn delete(&self, site: &Site, delete_empty_server_farm: bool) -> Result<(), ClientError> {
        let query = [("deleteEmptyServerFarm", delete_empty_server_farm.to_string())];
        let _: serde_json::Value = self
            .call(Method::DELETE, &site.id, SITES_API_VERSION, &query, None)
            .await?;
        Ok(())
    }

    async fn app_settings(&self, site: &Site) -> Result<StringDictionary, ClientError> {
        let path = format!("{}/config/appsettings/list", site.id);
        self.call(Method::POST, &path, SITES_API_VERSION, &[], None)
            .await
    }

    async fn put_app_settings(
        &self,
        site: &Site,
        settings: &StringDictionary,
    ) -> Result<StringDictionary, ClientError> {
        let path = format!("{}/config/appsettings", site.id);
        let body = serde_json::to_value(settings)?;
        self.call(Method::PUT, &path, SITES_API_VERSION, &[], Some(body))
            .await
    }

    async fn new_slot(
        &self,
        site: &Site,
        slot_name: &str,
        config_source: Option<&SiteConfig>,
    ) -> Result<Site, ClientError> {
        let path = format!("{}/slots/{slot_name}", site.id);
        let mut properties = serde_json::json!({
            "serverFarmId": site.properties.server_farm_id,
        });
        if let Some(config) = config_source {
            properties["siteConfig"] = serde_json::to_value(config)?;
        }
        let body = serde_json::json!({
            "location": site.location,
            "properties": properties,
        });
        self.call(Method::PUT, &path, SITES_API_VERSION, &[], Some(body))
            .await
    }
}

impl WebSiteManagement for ArmClient {
    fn list_web_apps<'a>(
        &'a self,
        next_link: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Page<Site>, ClientError>> {
        Box::pin(self.web_apps_page(next_link))
    }

    fn list_slots<'a>(&'a self, site: &'a Site) -> BoxFuture<'a, Result<Vec<Site>, ClientError>> {
        Box::pin(self.slots(site))
    }

    fn get_site_config<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        Box::pin(self.properties::<SiteConfig>(
            Method::GET,
            format!("{}/config/web", site.id),
            None,
        ))
    }

    fn update_site_config<'a>(
        &'a self,
        site: &'a Site,
        config: &'a SiteConfig,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        Box::pin(self.put_properties(format!("{}/config/web", site.id), config))
    }

    fn update_source_control<'a>(
        &'a self,
        site: &'a Site,
        source_control: &'a SiteSourceControl,
    ) -> BoxFuture<'a, Result<SiteSourceControl, ClientError>> {
        Box::pin(self.put_properties(format!("{}/sourcecontrols/web", site.id), source_control))
    }

    fn get_app_service_plan<'a>(
        &'a self,
        plan_id: &'a str,
    ) -> BoxFuture<'a, Result<AppServicePlan, ClientError>> {
        Box::pin(self.plan(plan_id))
    }

    fn delete_site<'a>(
        &'a self,
        site: &'a Site,
        delete_empty_server_farm: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(self.delete(site, delete_empty_server_farm))
    }

    fn publishing_credentials<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<PublishingCredentials, ClientError>> {
        Box::pin(self.properties::<PublishingCredentials>(
            Method::POST,
            format!("{}/config/publishingcredentials/list", site.id),
            None,
        ))
    }

    fn list_application_settings<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        Box::pin(self.app_settings(site))
    }

    fn update_application_settings<'a>(
        &'a self,
        site: &'a Site,
        settings: &'a StringDictionary,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        Box::pin(self.put_app_settings(site, settings))
    }

    fn create_slot<'a>(
        &'a self,
        site: &'a Site,
        slot_name: &'a str,
        config_source: Option<&'a SiteConfig>,
    ) -> BoxFuture<'a, Result<Site, ClientError>> {
        Box::pin(self.new_slot(site, slot_name, config_source))
    }
}
