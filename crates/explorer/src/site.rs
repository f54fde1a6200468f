//! Web app node and its folders.

use std::sync::Arc;

use appservice_client::{Site, WebSiteManagement};
use appservice_tree::{IconPath, ParentResource, Resource, TreeError, TreeResource};
use futures_util::future::BoxFuture;

use crate::app_settings::AppSettingsTreeItem;
use crate::catalog::SiteCatalog;
use crate::slots::{DeploymentSlotsTreeItem, SLOTS_FOLDER_ID};
use crate::{APP_SETTINGS_CONTEXT, APP_SETTING_CONTEXT, SLOTS_CONTEXT, SLOT_CONTEXT, WEB_APP_CONTEXT};

/// A production web app.
pub struct SiteTreeItem {
    site: Site,
    client: Arc<dyn WebSiteManagement>,
    catalog: SiteCatalog,
}

impl SiteTreeItem {
    pub fn new(site: Site, client: Arc<dyn WebSiteManagement>, catalog: SiteCatalog) -> Self {
        Self {
            site,
            client,
            catalog,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }
}

impl TreeResource for SiteTreeItem {
    fn id(&self) -> &str {
        &self.site.id
    }

    fn label(&self) -> String {
        self.site.name.clone()
    }

    fn context_value(&self) -> &str {
        WEB_APP_CONTEXT
    }

    /// State, when the app is not running.
    fn description(&self) -> Option<String> {
        let state = &self.site.properties.state;
        (!state.is_empty() && !state.eq_ignore_ascii_case("Running")).then(|| state.clone())
    }

    fn icon(&self) -> Option<IconPath> {
        Some(IconPath::Theme("azureWebApp".into()))
    }

    fn is_ancestor_of(&self, context_value: &str) -> bool {
        matches!(
            context_value,
            SLOTS_CONTEXT | SLOT_CONTEXT | APP_SETTINGS_CONTEXT | APP_SETTING_CONTEXT
        )
    }
}

impl ParentResource for SiteTreeItem {
    fn has_more_children(&self) -> bool {
        false
    }

    fn load_more_children(
        &self,
        _clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        let children = vec![
            Resource::parent(DeploymentSlotsTreeItem::new(
                self.site.clone(),
                Arc::clone(&self.client),
                self.catalog.clone(),
            )),
            Resource::parent(AppSettingsTreeItem::new(
                self.site.clone(),
                Arc::clone(&self.client),
            )),
        ];
        Box::pin(async move { Ok(children) })
    }

    /// Slots always live in the slots folder.
    fn pick_tree_item(&self, context_value: &str) -> Option<String> {
        match context_value {
            SLOTS_CONTEXT | SLOT_CONTEXT => Some(SLOTS_FOLDER_ID.to_string()),
            _ => None,
        }
    }
}
