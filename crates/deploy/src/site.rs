//! Site wrapper: names and collaborators shared by the workflows.

use std::fmt;
use std::sync::Arc;

use appservice_client::{ResourceId, Site, WebSiteManagement};

use crate::error::SiteError;
use crate::events::SiteLog;

/// A web app or deployment slot together with the management client used
/// to act on it.
///
/// The workflows live in their own modules: [`deploy`](Self::deploy),
/// [`delete`](Self::delete) and [`edit_scm_type`](Self::edit_scm_type).
pub struct SiteWrapper {
    site: Site,
    id: ResourceId,
    pub(crate) client: Arc<dyn WebSiteManagement>,
    pub(crate) log: SiteLog,
}

impl fmt::Debug for SiteWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteWrapper")
            .field("id", &self.site.id)
            .field("name", &self.site.name)
            .finish_non_exhaustive()
    }
}

impl SiteWrapper {
    /// Wraps `site`. Fails if its resource id is malformed.
    pub fn new(site: Site, client: Arc<dyn WebSiteManagement>) -> Result<Self, SiteError> {
        let id = site.resource_id()?;
        Ok(Self {
            site,
            id,
            client,
            log: SiteLog::silent(),
        })
    }

    /// Sends workflow output lines to `log`.
    pub fn with_log(mut self, log: SiteLog) -> Self {
        self.log = log;
        self
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.id
    }

    /// Resource name: `app` or `app/slot`.
    pub fn name(&self) -> &str {
        &self.site.name
    }

    pub fn site_name(&self) -> &str {
        self.site.site_name()
    }

    pub fn slot_name(&self) -> Option<&str> {
        self.site.slot_name()
    }

    pub fn is_slot(&self) -> bool {
        self.site.is_slot()
    }

    /// Display name: `app`, or `app-slot` for slots.
    pub fn app_name(&self) -> String {
        match self.slot_name() {
            Some(slot) => format!("{}-{slot}", self.site_name()),
            None => self.site_name().to_string(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.id.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.id.resource_group
    }

    /// Resource id of the App Service plan.
    pub fn plan_id(&self) -> &str {
        &self.site.properties.server_farm_id
    }

    pub fn default_host_name(&self) -> &str {
        &self.site.properties.default_host_name
    }

    pub fn scm_host(&self) -> String {
        self.site.scm_host()
    }
}
