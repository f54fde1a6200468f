//! Deleting a web app or slot.

use appservice_tree::{MessageLevel, Outcome, UserPrompt};
use tracing::debug;

use crate::error::SiteError;
use crate::site::SiteWrapper;

impl SiteWrapper {
    /// Deletes the site after confirmation.
    ///
    /// For a production site that is the last one in its App Service plan
    /// the user also decides whether the plan goes with it.
    pub async fn delete(&self, prompt: &dyn UserPrompt) -> Result<Outcome<()>, SiteError> {
        let name = self.app_name();
        let confirm = format!("Are you sure you want to delete \"{name}\"?");
        if prompt
            .show_message(MessageLevel::Warning, &confirm, &["Delete"])
            .await
            != Some(0)
        {
            return Ok(Outcome::Cancelled);
        }

        let mut delete_plan = false;
        if !self.is_slot() {
            let plan = self.client.get_app_service_plan(self.plan_id()).await?;
            debug!(site = %name, plan = %plan.name, sites = plan.number_of_sites(), "plan looked up");
            if plan.number_of_sites() <= 1 {
                let question = format!(
                    "This is the last app in the App Service plan \"{}\". Do you want to delete this App Service plan to prevent unexpected charges?",
                    plan.name
                );
                match prompt
                    .show_message(MessageLevel::Warning, &question, &["Yes", "No"])
                    .await
                {
                    Some(0) => delete_plan = true,
                    Some(_) => {}
                    None => return Ok(Outcome::Cancelled),
                }
            }
        }

        self.log.line(&name, format!("Deleting \"{name}\"..."));
        self.client.delete_site(self.site(), delete_plan).await?;
        self.log.line(&name, format!("Successfully deleted \"{name}\"."));
        Ok(Outcome::Done(()))
    }
}
