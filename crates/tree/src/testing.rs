//! Mock resources and prompts shared by the unit tests.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;

use crate::account::SubscriptionInfo;
use crate::error::TreeError;
use crate::node::{TreeContext, TreeNode};
use crate::outcome::Outcome;
use crate::resource::{
    ChildCreator, ChildProvider, ChildProviderFactory, CreateContext, ParentResource, Resource,
    StaticResource, TreeResource,
};
use crate::ui::{InputBoxOptions, MessageLevel, QuickPickItem, UserPrompt};

pub(crate) fn test_context() -> Arc<TreeContext> {
    Arc::new(TreeContext::new("test.loadMore"))
}

pub(crate) fn root_of(resource: impl ParentResource + 'static, ctx: Arc<TreeContext>) -> Arc<TreeNode> {
    TreeNode::root(Resource::parent(resource), ctx)
}

pub(crate) fn leaf(id: &str) -> Resource {
    tagged(id, "item")
}

pub(crate) fn tagged(id: &str, context_value: &str) -> Resource {
    Resource::leaf(StaticResource::new(id, id, context_value))
}

pub(crate) fn names(nodes: &[Arc<TreeNode>]) -> Vec<String> {
    nodes.iter().map(|n| n.label()).collect()
}

fn failure(message: &str) -> TreeError {
    TreeError::resource(std::io::Error::other(message.to_string()))
}

/// Serves canned pages; a cleared load restarts at the first page.
struct Pages {
    pages: Vec<Vec<Resource>>,
    cursor: Mutex<usize>,
    calls: Arc<Mutex<Vec<bool>>>,
    fail_with: Option<String>,
}

impl Pages {
    fn new(pages: Vec<Vec<Resource>>) -> Self {
        Self {
            pages,
            cursor: Mutex::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    fn has_more(&self) -> bool {
        *self.cursor.lock().unwrap() < self.pages.len()
    }

    fn next(&self, clear: bool) -> Result<Vec<Resource>, TreeError> {
        self.calls.lock().unwrap().push(clear);
        if let Some(message) = &self.fail_with {
            return Err(failure(message));
        }
        let mut cursor = self.cursor.lock().unwrap();
        if clear {
            *cursor = 0;
        }
        let page = self.pages.get(*cursor).cloned().unwrap_or_default();
        *cursor += 1;
        Ok(page)
    }
}

fn leaf_pages(pages: Vec<Vec<&str>>) -> Vec<Vec<Resource>> {
    pages
        .into_iter()
        .map(|page| page.into_iter().map(leaf).collect())
        .collect()
}

pub(crate) struct MockParent {
    id: String,
    context_value: String,
    pages: Pages,
    reversed: bool,
    creator: Option<Box<dyn ChildCreator>>,
    picks: Vec<(String, String)>,
    ancestor_of: Option<Vec<String>>,
}

impl MockParent {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            context_value: "parent".to_string(),
            pages: Pages::new(Vec::new()),
            reversed: false,
            creator: None,
            picks: Vec::new(),
            ancestor_of: None,
        }
    }

    pub(crate) fn with_pages(self, pages: Vec<Vec<&str>>) -> Self {
        self.with_resource_pages(leaf_pages(pages))
    }

    pub(crate) fn with_resource_pages(mut self, pages: Vec<Vec<Resource>>) -> Self {
        self.pages.pages = pages;
        self
    }

    pub(crate) fn with_context(mut self, context_value: &str) -> Self {
        self.context_value = context_value.to_string();
        self
    }

    pub(crate) fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub(crate) fn with_creator(self, name: &str) -> Self {
        self.with_custom_creator(MockCreator {
            name: name.to_string(),
        })
    }

    pub(crate) fn with_custom_creator(mut self, creator: impl ChildCreator + 'static) -> Self {
        self.creator = Some(Box::new(creator));
        self
    }

    pub(crate) fn with_pick(mut self, tag: &str, child_id: &str) -> Self {
        self.picks.push((tag.to_string(), child_id.to_string()));
        self
    }

    pub(crate) fn with_ancestor_of(mut self, tags: &[&str]) -> Self {
        self.ancestor_of = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Records the `clear_cache` flag of every fetch.
    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<bool>>> {
        Arc::clone(&self.pages.calls)
    }

    pub(crate) fn into_resource(self) -> Resource {
        Resource::parent(self)
    }
}

impl TreeResource for MockParent {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.id.clone()
    }

    fn context_value(&self) -> &str {
        &self.context_value
    }

    fn is_ancestor_of(&self, context_value: &str) -> bool {
        match &self.ancestor_of {
            Some(tags) => tags.iter().any(|t| t == context_value),
            None => true,
        }
    }
}

impl ParentResource for MockParent {
    fn child_type_label(&self) -> Option<String> {
        Some("Item".to_string())
    }

    fn has_more_children(&self) -> bool {
        self.pages.has_more()
    }

    fn load_more_children(
        &self,
        clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        let result = self.pages.next(clear_cache);
        Box::pin(async move { result })
    }

    fn creator(&self) -> Option<&dyn ChildCreator> {
        self.creator.as_deref()
    }

    fn compare_children(&self, a: &TreeNode, b: &TreeNode) -> Ordering {
        let ord = a.label().cmp(&b.label());
        if self.reversed { ord.reverse() } else { ord }
    }

    fn pick_tree_item(&self, context_value: &str) -> Option<String> {
        self.picks
            .iter()
            .find(|(tag, _)| tag == context_value)
            .map(|(_, id)| id.clone())
    }
}

/// Creates a leaf named after the preset name or its own name.
pub(crate) struct MockCreator {
    name: String,
}

impl ChildCreator for MockCreator {
    fn create_child<'a>(
        &'a self,
        ctx: CreateContext<'a>,
    ) -> BoxFuture<'a, Result<Outcome<Resource>, TreeError>> {
        Box::pin(async move {
            let name = ctx.options.name.clone().unwrap_or_else(|| self.name.clone());
            ctx.show_creating(&name);
            tokio::task::yield_now().await;
            Ok(Outcome::Done(leaf(&name)))
        })
    }
}

/// Shows a placeholder, records what the parent lists, then fails.
#[derive(Default)]
pub(crate) struct FailingCreator {
    pub(crate) seen: Arc<Mutex<Vec<String>>>,
}

impl ChildCreator for FailingCreator {
    fn create_child<'a>(
        &'a self,
        ctx: CreateContext<'a>,
    ) -> BoxFuture<'a, Result<Outcome<Resource>, TreeError>> {
        Box::pin(async move {
            ctx.show_creating("thing");
            let listed = names(&ctx.progress.parent().creating_children());
            self.seen.lock().unwrap().extend(listed);
            Err(failure("creation failed"))
        })
    }
}

/// Subscription children served from canned pages.
struct MockChildProvider {
    pages: Pages,
}

impl ChildProvider for MockChildProvider {
    fn child_type_label(&self) -> String {
        "Item".to_string()
    }

    fn has_more_children(&self) -> bool {
        self.pages.has_more()
    }

    fn load_more_children(
        &self,
        clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        let result = self.pages.next(clear_cache);
        Box::pin(async move { result })
    }
}

#[derive(Default)]
pub(crate) struct MockFactory {
    pages: Vec<Vec<&'static str>>,
    fail_with: Option<String>,
    children_fail_with: Option<String>,
}

impl MockFactory {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn with_pages(mut self, pages: Vec<Vec<&'static str>>) -> Self {
        self.pages = pages;
        self
    }

    pub(crate) fn failing_children(mut self, message: &str) -> Self {
        self.children_fail_with = Some(message.to_string());
        self
    }
}

impl ChildProviderFactory for MockFactory {
    fn for_subscription(
        &self,
        _subscription: &SubscriptionInfo,
    ) -> Result<Arc<dyn ChildProvider>, TreeError> {
        if let Some(message) = &self.fail_with {
            return Err(failure(message));
        }
        let mut pages = Pages::new(leaf_pages(self.pages.clone()));
        pages.fail_with = self.children_fail_with.clone();
        Ok(Arc::new(MockChildProvider { pages }))
    }
}

/// Prompt answering from scripted queues; an empty queue dismisses.
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    picks: Mutex<VecDeque<Option<usize>>>,
    shown_picks: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompt {
    pub(crate) fn with_picks(self, picks: Vec<Option<usize>>) -> Self {
        *self.picks.lock().unwrap() = picks.into();
        self
    }

    pub(crate) fn shown_picks(&self) -> Vec<Vec<String>> {
        self.shown_picks.lock().unwrap().clone()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn show_quick_pick<'a>(
        &'a self,
        items: &'a [QuickPickItem],
        _placeholder: &'a str,
    ) -> BoxFuture<'a, Option<usize>> {
        self.shown_picks
            .lock()
            .unwrap()
            .push(items.iter().map(|i| i.label.clone()).collect());
        let answer = self.picks.lock().unwrap().pop_front().flatten();
        Box::pin(async move { answer })
    }

    fn show_message<'a>(
        &'a self,
        _level: MessageLevel,
        _message: &'a str,
        _buttons: &'a [&'a str],
    ) -> BoxFuture<'a, Option<usize>> {
        Box::pin(async { None })
    }

    fn show_input_box<'a>(
        &'a self,
        _options: &'a InputBoxOptions,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async { None })
    }

    fn open_url(&self, _url: &str) {}
}
