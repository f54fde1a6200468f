//! Tree data provider: root nodes, host-facing queries and change events.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::account::{AccountEvent, AccountProvider, AccountStatus, SubscriptionInfo};
use crate::error::TreeError;
use crate::node::{TreeContext, TreeNode};
use crate::outcome::Outcome;
use crate::picker::no_match;
use crate::resource::{
    COMMAND_CONTEXT, ChildProviderFactory, ERROR_CONTEXT, IconPath, Resource, SUBSCRIPTION_CONTEXT,
    StaticResource, SubscriptionResource, TreeCommand,
};
use crate::ui::{QuickPickItem, UserPrompt};

/// Command the host runs to sign in.
pub const SIGN_IN_COMMAND: &str = "azure-account.login";
/// Command the host runs to create a free account.
pub const CREATE_ACCOUNT_COMMAND: &str = "azure-account.createAccount";
/// Command the host runs to edit the subscription filter.
pub const SELECT_SUBSCRIPTIONS_COMMAND: &str = "azure-account.selectSubscriptions";

const DEFAULT_LOAD_MORE_COMMAND: &str = "appService.loadMore";
const CREATE_ACCOUNT_URL: &str = "https://azure.microsoft.com/free/";

/// Change notification for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// The subtree rooted at `node_id` changed; `None` means the roots.
    Changed { node_id: Option<String> },
    /// A child node was created.
    NodeCreated { node_id: String },
}

/// Everything the host needs to render one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub context_value: String,
    pub icon: Option<IconPath>,
    pub command: Option<TreeCommand>,
    pub collapsible: bool,
}

/// Root of the tree. Maps account state to root nodes and answers the
/// host's tree queries.
pub struct TreeDataProvider {
    account: Arc<dyn AccountProvider>,
    factory: Arc<dyn ChildProviderFactory>,
    extra_roots: Vec<Resource>,
    ctx: Arc<TreeContext>,
    roots: Mutex<Option<CachedRoots>>,
    account_events: Mutex<broadcast::Receiver<AccountEvent>>,
}

/// Subscription nodes built for one filter snapshot.
struct CachedRoots {
    filters: Vec<SubscriptionInfo>,
    nodes: Arc<[Arc<TreeNode>]>,
}

impl TreeDataProvider {
    pub fn new(account: Arc<dyn AccountProvider>, factory: Arc<dyn ChildProviderFactory>) -> Self {
        let account_events = Mutex::new(account.subscribe());
        Self {
            account,
            factory,
            extra_roots: Vec::new(),
            ctx: Arc::new(TreeContext::new(DEFAULT_LOAD_MORE_COMMAND)),
            roots: Mutex::new(None),
            account_events,
        }
    }

    /// Adds resources shown after the subscription nodes.
    pub fn with_extra_roots(mut self, roots: Vec<Resource>) -> Self {
        self.extra_roots = roots;
        self
    }

    /// Sets the command attached to "Load More..." nodes. It receives the
    /// parent node id as its only argument.
    pub fn with_load_more_command(mut self, command: impl Into<String>) -> Self {
        self.ctx = Arc::new(TreeContext::new(command));
        self
    }

    /// Subscribes to tree change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.ctx.events.subscribe()
    }

    pub fn get_tree_item(&self, node: &TreeNode) -> TreeItem {
        TreeItem {
            id: node.id().to_string(),
            label: node.label(),
            description: node.description(),
            context_value: node.context_value().to_string(),
            icon: node.icon(),
            command: node.command(),
            collapsible: node.is_parent(),
        }
    }

    /// Children of `node`, or the roots. Failures are rendered as a single
    /// `Error: ...` node instead of being returned.
    pub async fn get_children(&self, node: Option<&Arc<TreeNode>>) -> Vec<Arc<TreeNode>> {
        match node {
            Some(node) => match node.children_for_display().await {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!(node = %node.id(), error = %e, "failed to load children");
                    vec![node.new_child(error_leaf(&e))]
                }
            },
            None => match self.root_nodes() {
                Ok(roots) => roots,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build root nodes");
                    vec![TreeNode::root(error_leaf(&e), Arc::clone(&self.ctx))]
                }
            },
        }
    }

    /// Invalidates `node` (or the roots) and notifies the host.
    ///
    /// Refreshing the roots always discards the subscription nodes; they
    /// are rebuilt from the account state on next access.
    pub fn refresh(&self, node: Option<&TreeNode>, clear_cache: bool) {
        match node {
            Some(node) => {
                if clear_cache {
                    node.clear_cache();
                }
                node.refresh();
            }
            None => {
                *self.lock_roots() = None;
                self.ctx.emit(TreeEvent::Changed { node_id: None });
            }
        }
    }

    fn lock_roots(&self) -> MutexGuard<'_, Option<CachedRoots>> {
        self.roots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drops the subscription nodes if the account changed since they were
    /// built, even when nobody runs [`watch_account`](Self::watch_account).
    fn discard_stale_roots(&self) {
        let mut events = self.account_events.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = false;
        loop {
            match events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed {
            *self.lock_roots() = None;
        }
    }

    fn root_nodes(&self) -> Result<Vec<Arc<TreeNode>>, TreeError> {
        self.discard_stale_roots();
        let status = self.account.status();
        let leaves = match status {
            AccountStatus::Initializing | AccountStatus::LoggingIn => {
                vec![command_leaf("azureLoading", "Loading...", SIGN_IN_COMMAND, "Sign In")
                    .with_icon(IconPath::Theme("loading".into()))]
            }
            AccountStatus::LoggedOut => vec![
                command_leaf("azureSignIn", "Sign in to Azure...", SIGN_IN_COMMAND, "Sign In"),
                command_leaf(
                    "azureCreateAccount",
                    "Create a Free Azure Account...",
                    CREATE_ACCOUNT_COMMAND,
                    "Create Account",
                )
                .with_description(CREATE_ACCOUNT_URL),
            ],
            AccountStatus::LoggedIn => {
                if self.account.filters().is_empty() {
                    vec![command_leaf(
                        "azureNoSubscriptions",
                        "No subscriptions found. Edit filters...",
                        SELECT_SUBSCRIPTIONS_COMMAND,
                        "Select Subscriptions",
                    )]
                } else {
                    return Ok(self.subscription_roots()?.to_vec());
                }
            }
        };
        *self.lock_roots() = None;
        Ok(leaves
            .into_iter()
            .map(|leaf| TreeNode::root(Resource::leaf(leaf), Arc::clone(&self.ctx)))
            .collect())
    }

    fn subscription_roots(&self) -> Result<Arc<[Arc<TreeNode>]>, TreeError> {
        let filters = self.account.filters();
        if let Some(cached) = self.lock_roots().as_ref() {
            if cached.filters == filters {
                return Ok(Arc::clone(&cached.nodes));
            }
        }

        let mut roots = Vec::new();
        for subscription in &filters {
            let children = self.factory.for_subscription(subscription)?;
            let resource = SubscriptionResource::new(subscription, children);
            roots.push(TreeNode::root(Resource::parent(resource), Arc::clone(&self.ctx)));
        }
        for extra in &self.extra_roots {
            roots.push(TreeNode::root(extra.clone(), Arc::clone(&self.ctx)));
        }
        tracing::debug!(count = roots.len(), "built root nodes");

        let roots: Arc<[Arc<TreeNode>]> = roots.into();
        *self.lock_roots() = Some(CachedRoots {
            filters,
            nodes: Arc::clone(&roots),
        });
        Ok(roots)
    }

    /// Walks down from `start` (or a subscription the user picks) until a
    /// node tagged with one of `expected` is reached.
    pub async fn show_node_picker(
        &self,
        expected: &[&str],
        start: Option<Arc<TreeNode>>,
        prompt: &dyn UserPrompt,
    ) -> Result<Outcome<Arc<TreeNode>>, TreeError> {
        let mut node = match start {
            Some(node) => node,
            None => match self.prompt_for_root(prompt).await? {
                Outcome::Done(node) => node,
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            },
        };

        loop {
            if expected.contains(&node.context_value()) {
                return Ok(Outcome::Done(node));
            }
            if !node.is_parent() {
                return Err(no_match(expected));
            }
            node = match node.pick_child_node(expected, prompt).await? {
                Outcome::Done(next) => next,
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            };
        }
    }

    async fn prompt_for_root(
        &self,
        prompt: &dyn UserPrompt,
    ) -> Result<Outcome<Arc<TreeNode>>, TreeError> {
        if self.account.status() != AccountStatus::LoggedIn {
            return Err(TreeError::NotSignedIn);
        }
        let subscriptions: Vec<Arc<TreeNode>> = self
            .root_nodes()?
            .into_iter()
            .filter(|n| n.context_value() == SUBSCRIPTION_CONTEXT)
            .collect();

        match subscriptions.len() {
            0 => Err(TreeError::NoSubscriptions),
            1 => Ok(Outcome::Done(Arc::clone(&subscriptions[0]))),
            _ => {
                let items: Vec<QuickPickItem> = subscriptions
                    .iter()
                    .map(|n| QuickPickItem::new(n.label()))
                    .collect();
                let Some(index) = prompt.show_quick_pick(&items, "Select a Subscription").await
                else {
                    return Ok(Outcome::Cancelled);
                };
                subscriptions
                    .get(index)
                    .cloned()
                    .map(Outcome::Done)
                    .ok_or_else(|| TreeError::InvalidSelection(format!("index {index} out of range")))
            }
        }
    }

    /// Finds a node by id, loading children along the id path as needed.
    pub async fn find_node(&self, id: &str) -> Result<Option<Arc<TreeNode>>, TreeError> {
        let roots = self.root_nodes()?;
        let Some(mut node) = roots.into_iter().find(|n| is_on_path(n.id(), id)) else {
            return Ok(None);
        };

        loop {
            if node.id() == id {
                return Ok(Some(node));
            }
            if !node.is_parent() {
                return Ok(None);
            }
            let mut children = node.cached_children().await?;
            let next = loop {
                if let Some(child) = children.iter().find(|c| is_on_path(c.id(), id)) {
                    break Some(Arc::clone(child));
                }
                if !node.has_more_children() {
                    break None;
                }
                children = node.load_more_children().await?;
            };
            match next {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
    }

    /// Refreshes the roots whenever the account status or filters change.
    ///
    /// Dropping the returned handle stops watching.
    pub fn watch_account(self: &Arc<Self>) -> AccountWatch {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut events = self.account.subscribe();
        let provider = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => {
                        match event {
                            Ok(event) => tracing::debug!(?event, "account changed"),
                            Err(RecvError::Lagged(missed)) => {
                                tracing::debug!(missed, "account events lagged");
                            }
                            Err(RecvError::Closed) => break,
                        }
                        let Some(provider) = provider.upgrade() else {
                            break;
                        };
                        provider.refresh(None, true);
                    }
                }
            }
        });

        AccountWatch {
            cancel,
            handle: Some(handle),
        }
    }
}

/// Subscription to account changes; dropping it stops the watch.
pub struct AccountWatch {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AccountWatch {
    /// Stops watching and waits for the watch task to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for AccountWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn is_on_path(candidate: &str, target: &str) -> bool {
    target == candidate
        || target
            .strip_prefix(candidate)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn command_leaf(id: &str, label: &str, command: &str, title: &str) -> StaticResource {
    StaticResource::new(id, label, COMMAND_CONTEXT).with_command(TreeCommand::new(command, title))
}

fn error_leaf(err: &TreeError) -> Resource {
    Resource::leaf(
        StaticResource::new("azureError", format!("Error: {err}"), ERROR_CONTEXT)
            .with_icon(IconPath::Theme("error".into())),
    )
}
