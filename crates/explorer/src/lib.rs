//! App Service resources for the explorer tree.
//!
//! Each subscription node lists its web apps through [`WebAppProvider`].
//! Below a web app sit its deployment slots and application settings.
//! Sites seen while loading are recorded in a [`SiteCatalog`] so hosts can
//! turn a picked node back into the [`Site`](appservice_client::Site) to act on.

pub mod app_settings;
pub mod catalog;
pub mod site;
pub mod slots;
pub mod web_apps;

#[cfg(test)]
mod testing;

/// Context value of web app nodes.
pub const WEB_APP_CONTEXT: &str = "appService";
/// Context value of the deployment slots folder.
pub const SLOTS_CONTEXT: &str = "deploymentSlots";
/// Context value of deployment slot nodes.
pub const SLOT_CONTEXT: &str = "deploymentSlot";
/// Context value of the application settings folder.
pub const APP_SETTINGS_CONTEXT: &str = "applicationSettings";
/// Context value of a single application setting.
pub const APP_SETTING_CONTEXT: &str = "appSetting";

pub use app_settings::{AppSettingTreeItem, AppSettingsTreeItem};
pub use catalog::SiteCatalog;
pub use site::SiteTreeItem;
pub use slots::{DeploymentSlotTreeItem, DeploymentSlotsTreeItem};
pub use web_apps::{ClientBuilder, WebAppProvider, WebAppProviderFactory};
