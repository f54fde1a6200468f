//! Changing the deployment source of a site.

use appservice_client::{ScmType, SiteSourceControl};
use appservice_tree::{InputBoxOptions, Outcome, QuickPickItem, UserPrompt};
use tracing::debug;

use crate::error::SiteError;
use crate::site::SiteWrapper;

const GITHUB_PREFIX: &str = "https://github.com/";
const DEFAULT_BRANCH: &str = "master";

/// Source types the picker offers.
const SUPPORTED: [ScmType; 3] = [ScmType::None, ScmType::LocalGit, ScmType::GitHub];

/// Picker order: the current type first, then the rest.
fn scm_choices(current: &ScmType) -> Vec<ScmType> {
    let mut choices = vec![current.clone()];
    choices.extend(SUPPORTED.iter().filter(|t| *t != current).cloned());
    choices
}

impl SiteWrapper {
    /// Lets the user pick a new deployment source and applies it.
    ///
    /// Picking the current type again is a cancellation. Switching to
    /// GitHub is only allowed from `None`.
    pub async fn edit_scm_type(&self, prompt: &dyn UserPrompt) -> Result<Outcome<ScmType>, SiteError> {
        let mut config = self.client.get_site_config(self.site()).await?;
        let current = config.scm_type.clone();

        let choices = scm_choices(&current);
        let items: Vec<QuickPickItem> = choices
            .iter()
            .map(|t| {
                let item = QuickPickItem::new(t.as_str());
                if *t == current {
                    item.with_description("$(check) Current")
                } else {
                    item
                }
            })
            .collect();

        let Some(index) = prompt.show_quick_pick(&items, "Select a new source.").await else {
            return Ok(Outcome::Cancelled);
        };
        let Some(new_type) = choices.get(index).cloned() else {
            return Ok(Outcome::Cancelled);
        };
        if new_type == current {
            debug!(site = %self.app_name(), scm_type = %current, "source type unchanged");
            return Ok(Outcome::Cancelled);
        }

        if new_type == ScmType::GitHub {
            if current != ScmType::None {
                return Err(SiteError::Configuration(format!(
                    "The scmType must be set to \"None\" before connecting to GitHub. \"{}\" currently uses \"{current}\".",
                    self.app_name()
                )));
            }
            if self.connect_github(prompt).await?.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
        } else {
            // The API only accepts the complete configuration.
            config.scm_type = new_type.clone();
            self.client.update_site_config(self.site(), &config).await?;
        }

        let name = self.app_name();
        self.log.line(
            &name,
            format!("Deployment source for \"{name}\" has been updated to \"{new_type}\"."),
        );
        Ok(Outcome::Done(new_type))
    }

    async fn connect_github(&self, prompt: &dyn UserPrompt) -> Result<Outcome<()>, SiteError> {
        let repo_options = InputBoxOptions::new("Enter the GitHub repository URL")
            .with_validator(|value| {
                let rest = value.trim().strip_prefix(GITHUB_PREFIX).unwrap_or_default();
                if rest.trim_matches('/').contains('/') {
                    None
                } else {
                    Some(format!("Enter a URL of the form {GITHUB_PREFIX}<owner>/<repository>"))
                }
            });
        let Some(repo_url) = prompt.show_input_box(&repo_options).await else {
            return Ok(Outcome::Cancelled);
        };

        let branch_options = InputBoxOptions::new("Enter the branch to deploy")
            .with_value(DEFAULT_BRANCH)
            .with_validator(|value| {
                value
                    .trim()
                    .is_empty()
                    .then(|| "The branch name cannot be empty".to_string())
            });
        let Some(branch) = prompt.show_input_box(&branch_options).await else {
            return Ok(Outcome::Cancelled);
        };

        let source_control = SiteSourceControl {
            repo_url: repo_url.trim().trim_end_matches('/').to_string(),
            branch: branch.trim().to_string(),
            is_manual_integration: false,
        };
        self.client
            .update_source_control(self.site(), &source_control)
            .await?;
        Ok(Outcome::Done(()))
    }
}
