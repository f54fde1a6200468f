//! Application settings of a site.

use std::sync::Arc;

use appservice_client::{Site, WebSiteManagement};
use appservice_tree::{IconPath, ParentResource, Resource, TreeError, TreeResource};
use futures_util::future::BoxFuture;

use crate::{APP_SETTING_CONTEXT, APP_SETTINGS_CONTEXT};

const HIDDEN_VALUE: &str = "Hidden value.";

/// The "Application Settings" folder of a site.
pub struct AppSettingsTreeItem {
    site: Site,
    client: Arc<dyn WebSiteManagement>,
}

impl AppSettingsTreeItem {
    pub fn new(site: Site, client: Arc<dyn WebSiteManagement>) -> Self {
        Self { site, client }
    }

    async fn list(&self) -> Result<Vec<Resource>, TreeError> {
        let settings = self
            .client
            .list_application_settings(&self.site)
            .await
            .map_err(TreeError::resource)?;
        Ok(settings
            .properties
            .into_iter()
            .map(|(key, value)| Resource::leaf(AppSettingTreeItem::new(key, value)))
            .collect())
    }
}

impl TreeResource for AppSettingsTreeItem {
    fn id(&self) -> &str {
        "application"
    }

    fn label(&self) -> String {
        "Application Settings".into()
    }

    fn context_value(&self) -> &str {
        APP_SETTINGS_CONTEXT
    }

    fn icon(&self) -> Option<IconPath> {
        Some(IconPath::Theme("settings".into()))
    }

    fn is_ancestor_of(&self, context_value: &str) -> bool {
        context_value == APP_SETTING_CONTEXT
    }
}

impl ParentResource for AppSettingsTreeItem {
    fn child_type_label(&self) -> Option<String> {
        Some("App Setting".into())
    }

    fn has_more_children(&self) -> bool {
        false
    }

    fn load_more_children(
        &self,
        _clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        Box::pin(self.list())
    }
}

/// One application setting. The value is kept but never shown.
pub struct AppSettingTreeItem {
    key: String,
    value: String,
}

impl AppSettingTreeItem {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl TreeResource for AppSettingTreeItem {
    fn id(&self) -> &str {
        &self.key
    }

    fn label(&self) -> String {
        format!("{}={HIDDEN_VALUE}", self.key)
    }

    fn context_value(&self) -> &str {
        APP_SETTING_CONTEXT
    }
}
