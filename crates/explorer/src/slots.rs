//! Deployment slots folder and slot nodes.

use std::sync::Arc;

use appservice_client::{Site, WebSiteManagement};
use appservice_tree::{
    ChildCreator, CreateContext, IconPath, InputBoxOptions, Outcome, ParentResource, Resource,
    TreeError, TreeResource,
};
use futures_util::future::BoxFuture;
use tracing::info;

use crate::catalog::SiteCatalog;
use crate::{SLOT_CONTEXT, SLOTS_CONTEXT};

/// Id of the slots folder below its web app. Matches the `slots` segment of
/// slot resource ids so slots can be found by id from the tree root.
pub const SLOTS_FOLDER_ID: &str = "slots";

/// Why `name` cannot be used for a new slot, if it cannot.
fn validate_slot_name(name: &str, existing: &[String]) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("The slot name cannot be empty.".into());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Some("The slot name can only contain letters, numbers, or hyphens.".into());
    }
    if existing.iter().any(|s| s.eq_ignore_ascii_case(name)) {
        return Some(format!("The slot name \"{name}\" is already in use."));
    }
    None
}

/// The "Deployment Slots" folder of a production web app.
pub struct DeploymentSlotsTreeItem {
    site: Site,
    client: Arc<dyn WebSiteManagement>,
    catalog: SiteCatalog,
}

impl DeploymentSlotsTreeItem {
    pub fn new(site: Site, client: Arc<dyn WebSiteManagement>, catalog: SiteCatalog) -> Self {
        Self {
            site,
            client,
            catalog,
        }
    }

    async fn slots(&self) -> Result<Vec<Site>, TreeError> {
        self.client
            .list_slots(&self.site)
            .await
            .map_err(TreeError::resource)
    }

    async fn list(&self) -> Result<Vec<Resource>, TreeError> {
        let slots = self.slots().await?;
        Ok(slots
            .into_iter()
            .map(|slot| {
                self.catalog.record(&slot, &self.client);
                Resource::leaf(DeploymentSlotTreeItem::new(slot))
            })
            .collect())
    }

    async fn create(&self, ctx: CreateContext<'_>) -> Result<Outcome<Resource>, TreeError> {
        let existing: Vec<String> = self
            .slots()
            .await?
            .iter()
            .filter_map(|s| s.slot_name().map(String::from))
            .collect();

        let name = match &ctx.options.name {
            Some(name) => {
                if let Some(reason) = validate_slot_name(name, &existing) {
                    return Err(TreeError::InvalidSelection(reason));
                }
                name.trim().to_string()
            }
            None => {
                let options = InputBoxOptions::new("Enter a unique name for the new deployment slot")
                    .with_validator(move |value| validate_slot_name(value, &existing));
                match ctx.prompt.show_input_box(&options).await {
                    Some(name) => name.trim().to_string(),
                    None => return Ok(Outcome::Cancelled),
                }
            }
        };

        // New slots start from the production configuration.
        let config = self
            .client
            .get_site_config(&self.site)
            .await
            .map_err(TreeError::resource)?;

        ctx.show_creating(&name);
        let slot = self
            .client
            .create_slot(&self.site, &name, Some(&config))
            .await
            .map_err(TreeError::resource)?;
        info!(site = %self.site.name, slot = %name, "created deployment slot");

        self.catalog.record(&slot, &self.client);
        Ok(Outcome::Done(Resource::leaf(DeploymentSlotTreeItem::new(slot))))
    }
}

impl TreeResource for DeploymentSlotsTreeItem {
    fn id(&self) -> &str {
        SLOTS_FOLDER_ID
    }

    fn label(&self) -> String {
        "Deployment Slots".into()
    }

    fn context_value(&self) -> &str {
        SLOTS_CONTEXT
    }

    fn icon(&self) -> Option<IconPath> {
        Some(IconPath::Theme("folder".into()))
    }

    fn is_ancestor_of(&self, context_value: &str) -> bool {
        context_value == SLOT_CONTEXT
    }
}

impl ParentResource for DeploymentSlotsTreeItem {
    fn child_type_label(&self) -> Option<String> {
        Some("Deployment Slot".into())
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

    fn creator(&self) -> Option<&dyn ChildCreator> {
        Some(self)
    }
}

impl ChildCreator for DeploymentSlotsTreeItem {
    fn create_child<'a>(
        &'a self,
        ctx: CreateContext<'a>,
    ) -> BoxFuture<'a, Result<Outcome<Resource>, TreeError>> {
        Box::pin(self.create(ctx))
    }
}

/// A deployment slot.
pub struct DeploymentSlotTreeItem {
    slot: Site,
}

impl DeploymentSlotTreeItem {
    pub fn new(slot: Site) -> Self {
        Self { slot }
    }

    pub fn site(&self) -> &Site {
        &self.slot
    }
}

impl TreeResource for DeploymentSlotTreeItem {
    fn id(&self) -> &str {
        &self.slot.id
    }

    fn label(&self) -> String {
        self.slot
            .slot_name()
            .unwrap_or(self.slot.name.as_str())
            .to_string()
    }

    fn context_value(&self) -> &str {
        SLOT_CONTEXT
    }

    fn icon(&self) -> Option<IconPath> {
        Some(IconPath::Theme("azureDeploymentSlot".into()))
    }
}
