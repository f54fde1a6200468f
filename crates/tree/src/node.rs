//! Tree nodes and the per-parent child cache.
//!
//! A [`TreeNode`] wraps one [`Resource`]. Parent nodes own a cache of
//! child nodes that is loaded lazily, one page at a time, and always kept
//! sorted by the resource's comparator. The cache is an immutable
//! `Arc<[Arc<TreeNode>]>` replaced wholesale on every change, so a
//! snapshot handed to a caller never changes underneath it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;

use crate::error::TreeError;
use crate::outcome::Outcome;
use crate::provider::TreeEvent;
use crate::resource::{
    CREATING_CONTEXT, CreateContext, CreateOptions, IconPath, LOAD_MORE_CONTEXT, ParentResource,
    Resource, StaticResource, TreeCommand,
};
use crate::ui::UserPrompt;

/// Id suffix of the "Load More..." node.
const LOAD_MORE_ID: &str = "azureLoadMore";

static NEXT_PLACEHOLDER: AtomicU64 = AtomicU64::new(1);

/// State shared by every node of one tree.
pub(crate) struct TreeContext {
    pub(crate) events: broadcast::Sender<TreeEvent>,
    pub(crate) load_more_command: String,
}

impl TreeContext {
    pub(crate) fn new(load_more_command: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            events,
            load_more_command: load_more_command.into(),
        }
    }

    pub(crate) fn emit(&self, event: TreeEvent) {
        // Nobody listening is not an error.
        let _ = self.events.send(event);
    }
}

/// One node of the tree.
pub struct TreeNode {
    id: String,
    resource: Resource,
    parent: Weak<TreeNode>,
    ctx: Arc<TreeContext>,
    children: Option<Mutex<ChildCache>>,
}

#[derive(Default)]
struct ChildCache {
    /// `None` until the first page is loaded.
    children: Option<Arc<[Arc<TreeNode>]>>,
    /// Placeholders shown while children are being created.
    creating: Vec<Arc<TreeNode>>,
    /// Whether the next fetch must restart paging.
    clear_pending: bool,
}

impl TreeNode {
    pub(crate) fn root(resource: Resource, ctx: Arc<TreeContext>) -> Arc<Self> {
        Arc::new(Self::build(resource.id().to_string(), resource, Weak::new(), ctx))
    }

    fn build(id: String, resource: Resource, parent: Weak<TreeNode>, ctx: Arc<TreeContext>) -> Self {
        let children = resource.as_parent().map(|_| {
            Mutex::new(ChildCache {
                clear_pending: true,
                ..ChildCache::default()
            })
        });
        Self {
            id,
            resource,
            parent,
            ctx,
            children,
        }
    }

    /// Wraps `resource` as a child of this node.
    pub(crate) fn new_child(self: &Arc<Self>, resource: Resource) -> Arc<TreeNode> {
        let rid = resource.id();
        let id = if rid.starts_with('/') {
            rid.to_string()
        } else {
            format!("{}/{}", self.id, rid)
        };
        Arc::new(Self::build(
            id,
            resource,
            Arc::downgrade(self),
            Arc::clone(&self.ctx),
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> String {
        self.resource.label()
    }

    pub fn context_value(&self) -> &str {
        self.resource.context_value()
    }

    pub fn description(&self) -> Option<String> {
        self.resource.description()
    }

    pub fn icon(&self) -> Option<IconPath> {
        self.resource.icon()
    }

    pub fn command(&self) -> Option<TreeCommand> {
        self.resource.command()
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn parent(&self) -> Option<Arc<TreeNode>> {
        self.parent.upgrade()
    }

    pub fn is_parent(&self) -> bool {
        self.children.is_some()
    }

    /// Whether nodes tagged `context_value` may be found below this node.
    pub fn is_ancestor_of(&self, context_value: &str) -> bool {
        match &self.resource {
            Resource::Parent(r) => r.is_ancestor_of(context_value),
            Resource::Leaf(_) => false,
        }
    }

    pub fn has_more_children(&self) -> bool {
        self.resource
            .as_parent()
            .is_some_and(|p| p.has_more_children())
    }

    /// Notifies listeners that this node's subtree changed.
    pub fn refresh(&self) {
        self.ctx.emit(TreeEvent::Changed {
            node_id: Some(self.id.clone()),
        });
    }

    fn parent_resource(&self, capability: &'static str) -> Result<&Arc<dyn ParentResource>, TreeError> {
        self.resource
            .as_parent()
            .ok_or_else(|| TreeError::NotImplemented {
                label: self.label(),
                capability,
            })
    }

    fn cache(&self) -> Option<MutexGuard<'_, ChildCache>> {
        self.children
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Current cached children, if any page has been loaded.
    pub fn loaded_children(&self) -> Option<Arc<[Arc<TreeNode>]>> {
        self.cache().and_then(|c| c.children.clone())
    }

    /// Returns the cached children, loading the first page if the cache
    /// is empty.
    pub async fn cached_children(self: &Arc<Self>) -> Result<Arc<[Arc<TreeNode>]>, TreeError> {
        if let Some(children) = self.loaded_children() {
            return Ok(children);
        }
        self.load_more_children().await
    }

    /// Fetches one more page of children, merges it into the cache and
    /// re-sorts. Returns the new cache.
    pub async fn load_more_children(self: &Arc<Self>) -> Result<Arc<[Arc<TreeNode>]>, TreeError> {
        let parent = Arc::clone(self.parent_resource("children")?);
        let clear = self.cache().is_some_and(|c| c.clear_pending);

        tracing::debug!(node = %self.id, clear, "loading children");
        let fetched = parent.load_more_children(clear).await?;
        let fetched: Vec<Arc<TreeNode>> = fetched.into_iter().map(|r| self.new_child(r)).collect();

        let mut cache = self
            .cache()
            .ok_or_else(|| TreeError::NotImplemented {
                label: self.label(),
                capability: "children",
            })?;
        let existing: Vec<Arc<TreeNode>> = if clear {
            Vec::new()
        } else {
            cache.children.as_deref().map(<[_]>::to_vec).unwrap_or_default()
        };
        let merged = merge_sorted(parent.as_ref(), existing, fetched);
        cache.children = Some(merged.clone());
        cache.clear_pending = false;
        Ok(merged)
    }

    /// Drops the cached children; the next load restarts paging.
    pub fn clear_cache(&self) {
        if let Some(mut cache) = self.cache() {
            cache.children = None;
            cache.clear_pending = true;
        }
    }

    /// Removes a child from the cache and refreshes this node.
    pub fn remove_child_from_cache(&self, child_id: &str) -> bool {
        let removed = match self.cache() {
            Some(mut cache) => match cache.children.clone() {
                Some(children) if children.iter().any(|c| c.id == child_id) => {
                    let kept: Vec<_> = children.iter().filter(|c| c.id != child_id).cloned().collect();
                    cache.children = Some(kept.into());
                    true
                }
                _ => false,
            },
            None => false,
        };
        if removed {
            self.refresh();
        }
        removed
    }

    /// Children to show in the host UI: creation placeholders, then the
    /// cached children, then a "Load More..." node when pages remain.
    pub async fn children_for_display(self: &Arc<Self>) -> Result<Vec<Arc<TreeNode>>, TreeError> {
        if !self.is_parent() {
            return Ok(Vec::new());
        }
        let cached = self.cached_children().await?;

        let mut nodes: Vec<Arc<TreeNode>> = self
            .cache()
            .map(|c| c.creating.clone())
            .unwrap_or_default();
        nodes.extend(cached.iter().cloned());
        if self.has_more_children() {
            nodes.push(self.load_more_node());
        }
        Ok(nodes)
    }

    fn load_more_node(self: &Arc<Self>) -> Arc<TreeNode> {
        let command = TreeCommand::new(self.ctx.load_more_command.clone(), "Load More")
            .with_argument(self.id.clone());
        let resource = StaticResource::new(LOAD_MORE_ID, "Load More...", LOAD_MORE_CONTEXT)
            .with_icon(IconPath::Theme("refresh".into()))
            .with_command(command);
        self.new_child(Resource::leaf(resource))
    }

    /// Creates a new child through the resource's creator.
    ///
    /// While the creator runs, any placeholder it shows is listed first
    /// among the children. The placeholder is gone by the time this
    /// returns, whatever the result.
    pub async fn create_child(
        self: &Arc<Self>,
        prompt: &dyn UserPrompt,
        options: &CreateOptions,
    ) -> Result<Outcome<Arc<TreeNode>>, TreeError> {
        let parent = Arc::clone(self.parent_resource("child creation")?);
        let creator = parent.creator().ok_or_else(|| TreeError::NotImplemented {
            label: self.label(),
            capability: "child creation",
        })?;

        let outcome = {
            let progress = CreationProgress::new(Arc::clone(self));
            let ctx = CreateContext {
                prompt,
                options,
                progress: &progress,
            };
            creator.create_child(ctx).await
        }?;

        let resource = match outcome {
            Outcome::Done(resource) => resource,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let node = self.new_child(resource);
        if self.loaded_children().is_none() {
            self.load_more_children().await?;
        }
        if let Some(mut cache) = self.cache() {
            let existing = cache.children.as_deref().map(<[_]>::to_vec).unwrap_or_default();
            cache.children = Some(merge_sorted(parent.as_ref(), existing, vec![Arc::clone(&node)]));
        }

        tracing::info!(parent = %self.id, child = %node.id, "created child");
        self.refresh();
        self.ctx.emit(TreeEvent::NodeCreated {
            node_id: node.id.clone(),
        });
        Ok(Outcome::Done(node))
    }

    fn add_placeholder(&self, node: Arc<TreeNode>) {
        if let Some(mut cache) = self.cache() {
            cache.creating.push(node);
        }
        self.refresh();
    }

    fn remove_placeholder(&self, id: &str) {
        if let Some(mut cache) = self.cache() {
            cache.creating.retain(|n| n.id != id);
        }
        self.refresh();
    }

    /// Placeholders currently shown under this node.
    pub fn creating_children(&self) -> Vec<Arc<TreeNode>> {
        self.cache().map(|c| c.creating.clone()).unwrap_or_default()
    }
}

impl std::fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("context_value", &self.context_value())
            .finish()
    }
}

/// Merges `fresh` into `existing` (same id: fresh wins) and sorts with
/// the parent's comparator.
fn merge_sorted(
    parent: &dyn ParentResource,
    existing: Vec<Arc<TreeNode>>,
    fresh: Vec<Arc<TreeNode>>,
) -> Arc<[Arc<TreeNode>]> {
    let fresh_ids: HashSet<&str> = fresh.iter().map(|n| n.id.as_str()).collect();
    let mut merged: Vec<Arc<TreeNode>> = existing
        .into_iter()
        .filter(|n| !fresh_ids.contains(n.id.as_str()))
        .collect();
    merged.extend(fresh);
    merged.sort_by(|a, b| parent.compare_children(a, b));
    merged.into()
}

/// Placeholder handle passed to creators through [`CreateContext`].
///
/// Removes its placeholder node when dropped.
pub struct CreationProgress {
    parent: Arc<TreeNode>,
    placeholder: Mutex<Option<String>>,
}

impl CreationProgress {
    fn new(parent: Arc<TreeNode>) -> Self {
        Self {
            parent,
            placeholder: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn parent(&self) -> &Arc<TreeNode> {
        &self.parent
    }

    /// Shows (or relabels) the `Creating <label>...` placeholder.
    pub fn show(&self, label: &str) {
        let seq = NEXT_PLACEHOLDER.fetch_add(1, AtomicOrdering::Relaxed);
        let resource = StaticResource::new(
            format!("azureCreating-{seq}"),
            format!("Creating {label}..."),
            CREATING_CONTEXT,
        )
        .with_icon(IconPath::Theme("loading".into()));
        let node = self.parent.new_child(Resource::leaf(resource));
        let new_id = node.id.clone();

        let previous = self
            .placeholder
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(new_id);
        if let Some(previous) = previous {
            if let Some(mut cache) = self.parent.cache() {
                cache.creating.retain(|n| n.id != previous);
            }
        }
        self.parent.add_placeholder(node);
    }
}

impl Drop for CreationProgress {
    fn drop(&mut self) {
        let placeholder = self
            .placeholder
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(id) = placeholder {
            self.parent.remove_placeholder(&id);
        }
    }
}
