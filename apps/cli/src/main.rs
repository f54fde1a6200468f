//! App Service explorer command-line host.

mod account;
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use appservice_client::{ArmClient, KuduConnector, SharedKeyBlobFactory, WebSiteManagement};
use appservice_deploy::{
    CommandGit, DeployContext, Settings, SiteEvent, SiteEvents, SiteLog, SiteWrapper,
    ZipDeployStrategy, settings_path,
};
use appservice_explorer::{
    SLOT_CONTEXT, SLOTS_CONTEXT, SiteCatalog, WEB_APP_CONTEXT, WebAppProviderFactory,
};
use appservice_tree::{
    CreateOptions, LOAD_MORE_CONTEXT, Outcome, SubscriptionInfo, TreeDataProvider, TreeNode,
};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::prompt::TerminalPrompt;

/// Browse and manage Azure App Service web apps.
#[derive(Parser, Debug)]
#[command(name = "appservice")]
#[command(version)]
#[command(about = "Browse, deploy and manage Azure App Service web apps", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Resource manager access token
    #[arg(long, global = true, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Subscriptions to show, as comma separated `id[=name]` entries
    #[arg(long, global = true, env = "AZURE_SUBSCRIPTIONS", default_value = "")]
    subscriptions: String,

    /// Answer confirmations with their first option
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resource tree
    Tree {
        /// Levels to expand below the subscriptions
        #[arg(long, default_value = "2")]
        depth: usize,

        /// Load every page instead of stopping at "Load More..."
        #[arg(long)]
        all_pages: bool,
    },

    /// Deploy a folder or .zip file to a web app or slot
    Deploy {
        path: PathBuf,

        /// Override the configured zip deploy strategy
        #[arg(long)]
        strategy: Option<Strategy>,
    },

    /// Delete a web app or slot
    Delete,

    /// Change the deployment source of a web app or slot
    Scm,

    /// Create a deployment slot
    #[command(name = "create-slot")]
    CreateSlot {
        /// Slot name; prompted for when omitted
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the settings file and its values
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Push,
    RunFromBlob,
}

impl From<Strategy> for ZipDeployStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::Push => ZipDeployStrategy::Push,
            Strategy::RunFromBlob => ZipDeployStrategy::RunFromBlob,
        }
    }
}

/// Site workflows log to the terminal through the event channel, so the
/// default filter stays quiet.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

struct App {
    provider: TreeDataProvider,
    catalog: SiteCatalog,
    prompt: TerminalPrompt,
}

impl App {
    fn new(cli: &Cli) -> Self {
        let subscriptions = account::parse_subscriptions(&cli.subscriptions);
        let account = Arc::new(account::account_state(cli.token.as_deref(), &subscriptions));

        let token = cli.token.clone().unwrap_or_default();
        let catalog = SiteCatalog::new();
        let factory = WebAppProviderFactory::new(
            Box::new(move |sub: &SubscriptionInfo| {
                let client = ArmClient::new(&sub.subscription_id, &token)?;
                Ok(Arc::new(client) as Arc<dyn WebSiteManagement>)
            }),
            catalog.clone(),
        );

        Self {
            provider: TreeDataProvider::new(account, Arc::new(factory)),
            catalog,
            prompt: TerminalPrompt::new(cli.yes),
        }
    }

    async fn print_tree(&self, depth: usize, all_pages: bool) -> Result<()> {
        let mut stack: Vec<(Arc<TreeNode>, usize)> = self
            .provider
            .get_children(None)
            .await
            .into_iter()
            .rev()
            .map(|n| (n, 0))
            .collect();

        while let Some((node, level)) = stack.pop() {
            let item = self.provider.get_tree_item(&node);
            let indent = "  ".repeat(level);
            match &item.description {
                Some(description) => println!("{indent}{}  ({description})", item.label),
                None => println!("{indent}{}", item.label),
            }

            if !item.collapsible || level >= depth || item.context_value == LOAD_MORE_CONTEXT {
                continue;
            }
            if all_pages {
                node.cached_children().await?;
                while node.has_more_children() {
                    node.load_more_children().await?;
                }
            }
            let children = self.provider.get_children(Some(&node)).await;
            stack.extend(children.into_iter().rev().map(|c| (c, level + 1)));
        }
        Ok(())
    }

    /// Asks for a web app or slot and wraps it for the site workflows.
    async fn pick_site(&self, log: SiteLog) -> Result<Option<(Arc<TreeNode>, SiteWrapper)>> {
        let picked = self
            .provider
            .show_node_picker(&[WEB_APP_CONTEXT, SLOT_CONTEXT], None, &self.prompt)
            .await?;
        let Outcome::Done(node) = picked else {
            return Ok(None);
        };
        let (site, client) = self
            .catalog
            .get(node.id())
            .with_context(|| format!("\"{}\" is not a known site", node.label()))?;
        let wrapper = SiteWrapper::new(site, client)?.with_log(log);
        Ok(Some((node, wrapper)))
    }

    async fn deploy(&self, path: PathBuf, strategy: Option<Strategy>, log: SiteLog) -> Result<()> {
        let mut settings = Settings::load()?;
        if let Some(strategy) = strategy {
            settings.zip_deploy_strategy = strategy.into();
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot read \"{}\"", path.display()))?;

        let Some((_, site)) = self.pick_site(log).await? else {
            return cancelled();
        };
        let ctx = DeployContext {
            prompt: &self.prompt,
            settings: &settings,
            git: &CommandGit,
            deployments: &KuduConnector,
            storage: &SharedKeyBlobFactory,
        };
        if site.deploy(&path, &ctx).await?.is_cancelled() {
            return cancelled();
        }
        Ok(())
    }

    async fn delete(&self, log: SiteLog) -> Result<()> {
        let Some((node, site)) = self.pick_site(log).await? else {
            return cancelled();
        };
        if site.delete(&self.prompt).await?.is_cancelled() {
            return cancelled();
        }
        if let Some(parent) = node.parent() {
            parent.remove_child_from_cache(node.id());
        }
        Ok(())
    }

    async fn edit_scm(&self, log: SiteLog) -> Result<()> {
        let Some((_, site)) = self.pick_site(log).await? else {
            return cancelled();
        };
        match site.edit_scm_type(&self.prompt).await? {
            Outcome::Done(_) => Ok(()),
            Outcome::Cancelled => cancelled(),
        }
    }

    async fn create_slot(&self, name: Option<String>) -> Result<()> {
        let picked = self
            .provider
            .show_node_picker(&[SLOTS_CONTEXT], None, &self.prompt)
            .await?;
        let Outcome::Done(folder) = picked else {
            return cancelled();
        };
        match folder.create_child(&self.prompt, &CreateOptions { name }).await? {
            Outcome::Done(slot) => {
                println!("Created deployment slot \"{}\".", slot.label());
                Ok(())
            }
            Outcome::Cancelled => cancelled(),
        }
    }
}

fn cancelled() -> Result<()> {
    eprintln!("Cancelled.");
    Ok(())
}

/// Terminal line for `event`, if it gets one. Failures reach the terminal
/// through the error `main` returns.
fn event_line(event: SiteEvent) -> Option<String> {
    match event {
        SiteEvent::Log { message, .. } => Some(message),
        SiteEvent::Completed { site } => {
            tracing::info!(site = %site, "deployment completed");
            None
        }
        SiteEvent::Failed { site, error } => {
            tracing::debug!(site = %site, error = %error, "deployment failed");
            None
        }
    }
}

/// Prints workflow events until every sender is gone.
fn spawn_event_printer(mut rx: mpsc::UnboundedReceiver<SiteEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = event_line(event) {
                println!("{line}");
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    let app = App::new(&cli);
    let mut events = SiteEvents::new();
    let printer = events
        .take_events()
        .map(spawn_event_printer)
        .context("event receiver already taken")?;

    let result = match cli.command {
        Commands::Tree { depth, all_pages } => app.print_tree(depth, all_pages).await,
        Commands::Deploy { path, strategy } => app.deploy(path, strategy, events.log()).await,
        Commands::Delete => app.delete(events.log()).await,
        Commands::Scm => app.edit_scm(events.log()).await,
        Commands::CreateSlot { name } => app.create_slot(name).await,
        Commands::Settings => {
            let settings = Settings::load()?;
            println!("{}", settings_path().display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    };

    // Closing the channel lets the printer drain and stop.
    drop(events);
    printer.await.context("event printer panicked")?;
    result
}
