//! Management API collaborator.
//!
//! `WebSiteManagement` is implemented by [`ArmClient`](crate::ArmClient)
//! for the real service and by mocks in tests. Sites are passed as
//! [`Site`] values so slot-aware implementations can pick the right
//! endpoint from the site id.

use futures_util::future::BoxFuture;

use crate::error::ClientError;
use crate::types::{
    AppServicePlan, Page, PublishingCredentials, Site, SiteConfig, SiteSourceControl,
    StringDictionary,
};

/// Web site operations of the resource manager.
pub trait WebSiteManagement: Send + Sync {
    /// Lists web apps in the subscription, one page at a time.
    ///
    /// `next_link` is `None` for the first page.
    fn list_web_apps<'a>(
        &'a self,
        next_link: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Page<Site>, ClientError>>;

    /// Lists deployment slots of a production site.
    fn list_slots<'a>(&'a self, site: &'a Site)
    -> BoxFuture<'a, Result<Vec<Site>, ClientError>>;

    /// Reads the complete site configuration.
    fn get_site_config<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>>;

    /// Replaces the complete site configuration.
    fn update_site_config<'a>(
        &'a self,
        site: &'a Site,
        config: &'a SiteConfig,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>>;

    /// Binds a repository as the site's source control.
    fn update_source_control<'a>(
        &'a self,
        site: &'a Site,
        source_control: &'a SiteSourceControl,
    ) -> BoxFuture<'a, Result<SiteSourceControl, ClientError>>;

    /// Fetches an App Service plan by resource id.
    fn get_app_service_plan<'a>(
        &'a self,
        plan_id: &'a str,
    ) -> BoxFuture<'a, Result<AppServicePlan, ClientError>>;

    /// Deletes a site or slot.
    ///
    /// `delete_empty_server_farm` also removes the plan if it becomes empty.
    fn delete_site<'a>(
        &'a self,
        site: &'a Site,
        delete_empty_server_farm: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>>;

    /// Returns deployment credentials for the site.
    fn publishing_credentials<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<PublishingCredentials, ClientError>>;

    /// Lists application settings.
    fn list_application_settings<'a>(
        &'a self,
        site: &'a Site,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>>;

    /// Replaces application settings.
    fn update_application_settings<'a>(
        &'a self,
        site: &'a Site,
        settings: &'a StringDictionary,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>>;

    /// Creates a deployment slot, optionally cloning `config_source`.
    fn create_slot<'a>(
        &'a self,
        site: &'a Site,
        slot_name: &'a str,
        config_source: Option<&'a SiteConfig>,
    ) -> BoxFuture<'a, Result<Site, ClientError>>;
}
