//! Deploy workflow.
//!
//! The site's source control type decides the path: local git sites get a
//! push of `HEAD:master`, GitHub sites are refused, everything else gets a
//! zip package through the configured [`ZipDeployStrategy`].

use std::path::Path;

use appservice_client::kudu::LATEST_DEPLOYMENT;
use appservice_client::{
    BlobStorageFactory, DeployStatus, DeploymentService, DeploymentServiceFactory, ScmType,
    StorageConnectionString,
};
use appservice_tree::{MessageLevel, Outcome, UserPrompt};
use chrono::{Duration, Utc};
use tracing::debug;

use crate::error::SiteError;
use crate::git::{GitClient, GitError, remote_url};
use crate::package::resolve_package;
use crate::settings::{Settings, ZipDeployStrategy};
use crate::site::SiteWrapper;

/// App setting holding the storage account used by run-from-blob.
pub const STORAGE_SETTING: &str = "AzureWebJobsStorage";
/// App setting pointing the site at its package.
pub const RUN_FROM_ZIP_SETTING: &str = "WEBSITE_USE_ZIP";

const GIT_DOWNLOAD_URL: &str = "https://git-scm.com/downloads";
const GIT_REFSPEC: &str = "HEAD:master";

/// Collaborators a deployment needs besides the management client.
pub struct DeployContext<'a> {
    pub prompt: &'a dyn UserPrompt,
    pub settings: &'a Settings,
    pub git: &'a dyn GitClient,
    pub deployments: &'a dyn DeploymentServiceFactory,
    pub storage: &'a dyn BlobStorageFactory,
}

impl SiteWrapper {
    /// Deploys `path` to the site.
    pub async fn deploy(&self, path: &Path, ctx: &DeployContext<'_>) -> Result<Outcome<()>, SiteError> {
        let config = self.client.get_site_config(self.site()).await?;
        debug!(site = %self.app_name(), scm_type = %config.scm_type, "deploying");

        let outcome = match config.scm_type {
            ScmType::LocalGit => self.local_git_deploy(path, ctx).await,
            ScmType::GitHub => Err(SiteError::Configuration(format!(
                "\"{}\" is connected to a GitHub repository. Push to GitHub to deploy.",
                self.app_name()
            ))),
            _ => self.zip_deploy(path, ctx).await,
        };

        match &outcome {
            Ok(Outcome::Done(())) => {
                self.log
                    .line(&self.app_name(), format!("Deployment to \"{}\" completed.", self.app_name()));
                self.log.completed(&self.app_name());
            }
            Ok(Outcome::Cancelled) => debug!(site = %self.app_name(), "deploy cancelled"),
            Err(e) => self.log.failed(&self.app_name(), &e.to_string()),
        }
        outcome
    }

    async fn local_git_deploy(&self, path: &Path, ctx: &DeployContext<'_>) -> Result<Outcome<()>, SiteError> {
        let name = self.app_name();
        let credentials = self.client.publishing_credentials(self.site()).await?;
        let remote = remote_url(&credentials, &self.scm_host(), &self.site().repository_name());

        match ctx.git.has_uncommitted_changes(path).await {
            Ok(false) => {}
            Ok(true) => {
                let message = format!(
                    "Local repository \"{}\" has uncommitted changes. Deploy anyway?",
                    path.display()
                );
                let choice = ctx
                    .prompt
                    .show_message(MessageLevel::Warning, &message, &["Deploy Anyway"])
                    .await;
                if choice != Some(0) {
                    return Ok(Outcome::Cancelled);
                }
            }
            Err(GitError::NotInstalled) => return Ok(self.offer_git_download(ctx).await),
            Err(e) => return Err(e.into()),
        }

        self.log
            .line(&name, format!("Deploying Local Git repository to \"{name}\"..."));
        match ctx.git.push(path, &remote, GIT_REFSPEC, false).await {
            Ok(()) => Ok(Outcome::Done(())),
            Err(GitError::NotInstalled) => Ok(self.offer_git_download(ctx).await),
            Err(GitError::Rejected(_)) => {
                let choice = ctx
                    .prompt
                    .show_message(
                        MessageLevel::Warning,
                        "Push rejected due to Git history diverging.",
                        &["Force Push"],
                    )
                    .await;
                if choice != Some(0) {
                    return Ok(Outcome::Cancelled);
                }
                self.log.line(&name, "Force pushing...");
                ctx.git.push(path, &remote, GIT_REFSPEC, true).await?;
                Ok(Outcome::Done(()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn offer_git_download(&self, ctx: &DeployContext<'_>) -> Outcome<()> {
        let choice = ctx
            .prompt
            .show_message(
                MessageLevel::Error,
                "Git must be installed to use Local Git Deploy.",
                &["Download Git"],
            )
            .await;
        if choice == Some(0) {
            ctx.prompt.open_url(GIT_DOWNLOAD_URL);
        }
        Outcome::Cancelled
    }

    async fn zip_deploy(&self, path: &Path, ctx: &DeployContext<'_>) -> Result<Outcome<()>, SiteError> {
        let name = self.app_name();
        if ctx.settings.show_deploy_confirmation {
            let message = format!(
                "Are you sure you want to deploy to \"{name}\"? This will overwrite any previous deployment and cannot be undone."
            );
            let choice = ctx
                .prompt
                .show_message(MessageLevel::Warning, &message, &["Deploy"])
                .await;
            if choice != Some(0) {
                return Ok(Outcome::Cancelled);
            }
        }

        if path.is_dir() {
            self.log.line(&name, "Creating zip package...");
        }
        // Dropped on every exit path below, removing any zip made here.
        let package = resolve_package(path, &ctx.settings.zip_ignore_patterns).await?;

        match ctx.settings.zip_deploy_strategy {
            ZipDeployStrategy::Push => self.push_and_wait(package.path(), ctx).await?,
            ZipDeployStrategy::RunFromBlob => self.run_from_blob(package.path(), ctx).await?,
        }
        Ok(Outcome::Done(()))
    }

    async fn push_and_wait(&self, zip: &Path, ctx: &DeployContext<'_>) -> Result<(), SiteError> {
        let name = self.app_name();
        let credentials = self.client.publishing_credentials(self.site()).await?;
        let kudu = ctx.deployments.connect(&self.scm_host(), &credentials)?;

        self.log
            .line(&name, format!("Deploying \"{}\" to \"{name}\"...", zip.display()));
        kudu.zip_push_deploy(zip, true).await?;
        self.wait_for_deployment(kudu.as_ref(), ctx.settings.poll_interval())
            .await
    }

    /// Polls until the deployment reports `complete`, logging each new
    /// progress message. Starts with the `latest` deployment and follows
    /// the permanent id once the service assigns one.
    async fn wait_for_deployment(
        &self,
        kudu: &dyn DeploymentService,
        interval: std::time::Duration,
    ) -> Result<(), SiteError> {
        let name = self.app_name();
        let mut deployment_id = LATEST_DEPLOYMENT.to_string();
        let mut last_progress = String::new();

        loop {
            tokio::time::sleep(interval).await;
            let result = kudu.deploy_result(&deployment_id).await?;

            if deployment_id == LATEST_DEPLOYMENT && !result.is_temp && !result.id.is_empty() {
                debug!(site = %name, id = %result.id, "deployment id assigned");
                deployment_id = result.id.clone();
            }
            if !result.progress.is_empty() && result.progress != last_progress {
                self.log.line(&name, result.progress.clone());
                last_progress = result.progress.clone();
            }
            if !result.complete {
                continue;
            }

            return match result.deploy_status() {
                DeployStatus::Failed => Err(SiteError::DeploymentFailed {
                    site: name,
                    message: if result.status_text.is_empty() {
                        "the deployment service reported a failure".into()
                    } else {
                        result.status_text
                    },
                }),
                _ => Ok(()),
            };
        }
    }

    async fn run_from_blob(&self, zip: &Path, ctx: &DeployContext<'_>) -> Result<(), SiteError> {
        let name = self.app_name();
        let mut app_settings = self.client.list_application_settings(self.site()).await?;
        let raw = app_settings
            .properties
            .get(STORAGE_SETTING)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                SiteError::Configuration(format!(
                    "\"{name}\" must have an \"{STORAGE_SETTING}\" application setting to run from a package."
                ))
            })?;
        let connection = StorageConnectionString::parse(raw)?;
        let storage = ctx.storage.connect(&connection)?;

        let container = ctx.settings.run_from_blob_container.as_str();
        let blob_name = format!("{name}-{}.zip", uuid::Uuid::new_v4());
        self.log.line(&name, format!("Uploading package to \"{container}/{blob_name}\"..."));
        storage.ensure_container(container).await?;
        storage.upload_file(container, &blob_name, zip).await?;

        let now = Utc::now();
        let url = storage.read_sas_url(
            container,
            &blob_name,
            now - Duration::minutes(5),
            now + Duration::days(365 * 10),
        )?;

        app_settings
            .properties
            .insert(RUN_FROM_ZIP_SETTING.to_string(), url);
        self.log.line(&name, "Updating application settings...");
        self.client
            .update_application_settings(self.site(), &app_settings)
            .await?;
        Ok(())
    }
}
