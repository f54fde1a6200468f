//! Site workflows for App Service web apps and slots.
//!
//! [`SiteWrapper`] pairs a site with its management client and carries the
//! user-facing workflows:
//!
//! - **deploy**: local git push, or a zip package pushed to the deployment
//!   service (then polled) or uploaded to blob storage and run from there
//! - **delete**: with an offer to remove a plan left empty
//! - **edit_scm_type**: switch the deployment source
//!
//! Progress lines go to a [`SiteLog`]; user interaction goes through the
//! tree crate's [`UserPrompt`](appservice_tree::UserPrompt).

pub mod delete;
pub mod deploy;
pub mod error;
pub mod events;
pub mod git;
pub mod package;
pub mod scm;
pub mod settings;
pub mod site;

#[cfg(test)]
mod testing;

pub use deploy::{DeployContext, RUN_FROM_ZIP_SETTING, STORAGE_SETTING};
pub use error::SiteError;
pub use events::{SiteEvent, SiteEvents, SiteLog};
pub use git::{CommandGit, GitClient, GitError, remote_url};
pub use package::{DeployPackage, resolve_package, zip_directory};
pub use settings::{Settings, ZipDeployStrategy, settings_path};
pub use site::SiteWrapper;
