//! Resource capability traits.
//!
//! A concrete resource type implements [`TreeResource`] for display and,
//! if it can have children, [`ParentResource`]. Optional capabilities
//! (child creation, custom ordering, deterministic picking) are trait
//! methods with defaults, so a node never has to test for them at
//! runtime.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::TreeError;
use crate::node::{CreationProgress, TreeNode};
use crate::outcome::Outcome;
use crate::ui::UserPrompt;

/// Context value of synthetic command nodes (sign in, edit filters, ...).
pub const COMMAND_CONTEXT: &str = "azureCommand";
/// Context value of the "Load More..." node.
pub const LOAD_MORE_CONTEXT: &str = "azureLoadMore";
/// Context value of the transient "Creating..." node.
pub const CREATING_CONTEXT: &str = "azureCreating";
/// Context value of error nodes.
pub const ERROR_CONTEXT: &str = "azureError";
/// Context value of subscription nodes.
pub const SUBSCRIPTION_CONTEXT: &str = "azureSubscription";

/// Icon shown next to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconPath {
    /// A named icon from the host's theme.
    Theme(String),
    /// Separate images for light and dark themes.
    File { light: PathBuf, dark: PathBuf },
}

/// Command invoked when a node is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeCommand {
    pub id: String,
    pub title: String,
    pub arguments: Vec<String>,
}

impl TreeCommand {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }
}

/// Display information every resource provides.
pub trait TreeResource: Send + Sync {
    /// Identifier, unique among siblings. Ids starting with `/` are
    /// treated as absolute and used as the node id unchanged.
    fn id(&self) -> &str;

    fn label(&self) -> String;

    /// Classification tag used for menus and pickers.
    fn context_value(&self) -> &str;

    fn description(&self) -> Option<String> {
        None
    }

    fn icon(&self) -> Option<IconPath> {
        None
    }

    fn command(&self) -> Option<TreeCommand> {
        None
    }

    /// Whether nodes tagged `context_value` may live below this one.
    ///
    /// Only consulted for parents; unknown means "maybe".
    fn is_ancestor_of(&self, _context_value: &str) -> bool {
        true
    }
}

/// A resource with lazily loaded children.
pub trait ParentResource: TreeResource {
    /// Singular name of the children ("Web App", "Deployment Slot").
    fn child_type_label(&self) -> Option<String> {
        None
    }

    /// Whether another page can be loaded.
    fn has_more_children(&self) -> bool;

    /// Loads the next page of children. `clear_cache` restarts paging
    /// from the first page.
    fn load_more_children(&self, clear_cache: bool)
    -> BoxFuture<'_, Result<Vec<Resource>, TreeError>>;

    /// Child creation capability.
    fn creator(&self) -> Option<&dyn ChildCreator> {
        None
    }

    /// Ordering of cached children.
    fn compare_children(&self, a: &TreeNode, b: &TreeNode) -> Ordering {
        a.label().cmp(&b.label())
    }

    /// Resolves a child id for `context_value` without asking the user.
    fn pick_tree_item(&self, _context_value: &str) -> Option<String> {
        None
    }
}

/// Options forwarded to [`ChildCreator::create_child`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Preset name; creators skip the name prompt when set.
    pub name: Option<String>,
}

/// Everything a creator gets while creating a child.
pub struct CreateContext<'a> {
    pub prompt: &'a dyn UserPrompt,
    pub options: &'a CreateOptions,
    pub(crate) progress: &'a CreationProgress,
}

impl CreateContext<'_> {
    /// Shows a transient `Creating <label>...` node under the parent.
    /// The node is removed once creation ends, however it ends.
    pub fn show_creating(&self, label: &str) {
        self.progress.show(label);
    }
}

/// Creates new children of a parent resource.
pub trait ChildCreator: Send + Sync {
    fn create_child<'a>(
        &'a self,
        ctx: CreateContext<'a>,
    ) -> BoxFuture<'a, Result<Outcome<Resource>, TreeError>>;
}

/// A resource of either shape.
#[derive(Clone)]
pub enum Resource {
    Leaf(Arc<dyn TreeResource>),
    Parent(Arc<dyn ParentResource>),
}

impl Resource {
    pub fn leaf(resource: impl TreeResource + 'static) -> Self {
        Resource::Leaf(Arc::new(resource))
    }

    pub fn parent(resource: impl ParentResource + 'static) -> Self {
        Resource::Parent(Arc::new(resource))
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Leaf(r) => r.id(),
            Resource::Parent(r) => r.id(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Resource::Leaf(r) => r.label(),
            Resource::Parent(r) => r.label(),
        }
    }

    pub fn context_value(&self) -> &str {
        match self {
            Resource::Leaf(r) => r.context_value(),
            Resource::Parent(r) => r.context_value(),
        }
    }

    pub fn description(&self) -> Option<String> {
        match self {
            Resource::Leaf(r) => r.description(),
            Resource::Parent(r) => r.description(),
        }
    }

    pub fn icon(&self) -> Option<IconPath> {
        match self {
            Resource::Leaf(r) => r.icon(),
            Resource::Parent(r) => r.icon(),
        }
    }

    pub fn command(&self) -> Option<TreeCommand> {
        match self {
            Resource::Leaf(r) => r.command(),
            Resource::Parent(r) => r.command(),
        }
    }

    pub fn as_parent(&self) -> Option<&Arc<dyn ParentResource>> {
        match self {
            Resource::Parent(r) => Some(r),
            Resource::Leaf(_) => None,
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Resource::Leaf(_) => "Leaf",
            Resource::Parent(_) => "Parent",
        };
        f.debug_struct(kind)
            .field("id", &self.id())
            .field("context_value", &self.context_value())
            .finish()
    }
}

/// A leaf whose display data is fixed at construction.
///
/// Used for synthetic nodes (loading, sign in, load more, errors) and
/// handy for simple leaves such as key/value settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResource {
    pub id: String,
    pub label: String,
    pub context_value: String,
    pub description: Option<String>,
    pub icon: Option<IconPath>,
    pub command: Option<TreeCommand>,
}

impl StaticResource {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        context_value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            context_value: context_value.into(),
            description: None,
            icon: None,
            command: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: IconPath) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_command(mut self, command: TreeCommand) -> Self {
        self.command = Some(command);
        self
    }
}

impl TreeResource for StaticResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn context_value(&self) -> &str {
        &self.context_value
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn icon(&self) -> Option<IconPath> {
        self.icon.clone()
    }

    fn command(&self) -> Option<TreeCommand> {
        self.command.clone()
    }
}

// ---------------------------------------------------------------------------
// Subscription roots
// ---------------------------------------------------------------------------

/// Supplies the children of one subscription node.
pub trait ChildProvider: Send + Sync {
    fn child_type_label(&self) -> String;

    fn has_more_children(&self) -> bool;

    fn load_more_children(&self, clear_cache: bool)
    -> BoxFuture<'_, Result<Vec<Resource>, TreeError>>;

    fn creator(&self) -> Option<&dyn ChildCreator> {
        None
    }

    fn compare_children(&self, a: &TreeNode, b: &TreeNode) -> Ordering {
        a.label().cmp(&b.label())
    }
}

/// Builds a [`ChildProvider`] for each selected subscription.
pub trait ChildProviderFactory: Send + Sync {
    fn for_subscription(
        &self,
        subscription: &crate::account::SubscriptionInfo,
    ) -> Result<Arc<dyn ChildProvider>, TreeError>;
}

/// Parent resource for a subscription root node.
pub(crate) struct SubscriptionResource {
    id: String,
    display_name: String,
    subscription_id: String,
    children: Arc<dyn ChildProvider>,
}

impl SubscriptionResource {
    pub(crate) fn new(
        subscription: &crate::account::SubscriptionInfo,
        children: Arc<dyn ChildProvider>,
    ) -> Self {
        Self {
            id: format!("/subscriptions/{}", subscription.subscription_id),
            display_name: subscription.display_name.clone(),
            subscription_id: subscription.subscription_id.clone(),
            children,
        }
    }
}

impl TreeResource for SubscriptionResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        if self.display_name.is_empty() {
            self.subscription_id.clone()
        } else {
            self.display_name.clone()
        }
    }

    fn context_value(&self) -> &str {
        SUBSCRIPTION_CONTEXT
    }

    fn icon(&self) -> Option<IconPath> {
        Some(IconPath::Theme("azureSubscription".into()))
    }
}

impl ParentResource for SubscriptionResource {
    fn child_type_label(&self) -> Option<String> {
        Some(self.children.child_type_label())
    }

    fn has_more_children(&self) -> bool {
        self.children.has_more_children()
    }

    fn load_more_children(
        &self,
        clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        self.children.load_more_children(clear_cache)
    }

    fn creator(&self) -> Option<&dyn ChildCreator> {
        self.children.creator()
    }

    fn compare_children(&self, a: &TreeNode, b: &TreeNode) -> Ordering {
        self.children.compare_children(a, b)
    }
}
