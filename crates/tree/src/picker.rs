//! Interactive descent into a parent's children.

use std::sync::Arc;

use crate::error::TreeError;
use crate::node::TreeNode;
use crate::outcome::Outcome;
use crate::resource::CreateOptions;
use crate::ui::{QuickPickItem, UserPrompt};

enum Pick {
    Create,
    Child(Arc<TreeNode>),
    LoadMore,
}

impl TreeNode {
    /// Picks one child of this node that is, or may lead to, a node
    /// tagged with one of `expected`.
    ///
    /// A deterministic match from the resource wins; otherwise the user
    /// chooses. Choosing "Load More..." fetches a page and returns this
    /// node so the caller asks again.
    pub async fn pick_child_node(
        self: &Arc<Self>,
        expected: &[&str],
        prompt: &dyn UserPrompt,
    ) -> Result<Outcome<Arc<TreeNode>>, TreeError> {
        let parent = match self.resource().as_parent() {
            Some(p) => Arc::clone(p),
            None => return Err(no_match(expected)),
        };
        let children = self.cached_children().await?;

        for tag in expected {
            let Some(wanted) = parent.pick_tree_item(tag) else {
                continue;
            };
            let found = children
                .iter()
                .find(|c| c.resource().id() == wanted || c.id() == wanted);
            if let Some(child) = found {
                tracing::debug!(node = %self.id(), child = %child.id(), "picked without prompting");
                return Ok(Outcome::Done(Arc::clone(child)));
            }
        }

        let type_label = parent.child_type_label();
        let mut picks = Vec::new();
        let mut items = Vec::new();

        if let (Some(label), Some(_)) = (&type_label, parent.creator()) {
            picks.push(Pick::Create);
            items.push(QuickPickItem::new(format!("$(plus) Create new {label}...")));
        }
        for child in children.iter() {
            let eligible = expected.contains(&child.context_value())
                || (child.is_parent() && child.is_ancestor_of_any(expected));
            if eligible {
                let mut item = QuickPickItem::new(child.label());
                item.description = child.description();
                items.push(item);
                picks.push(Pick::Child(Arc::clone(child)));
            }
        }
        if self.has_more_children() {
            picks.push(Pick::LoadMore);
            items.push(QuickPickItem::new("$(sync) Load More..."));
        }

        if picks.is_empty() {
            return Err(no_match(expected));
        }

        let placeholder = match &type_label {
            Some(label) => format!("Select a {label}"),
            None => "Select a resource".to_string(),
        };
        let Some(index) = prompt.show_quick_pick(&items, &placeholder).await else {
            return Ok(Outcome::Cancelled);
        };

        match picks.into_iter().nth(index) {
            Some(Pick::Child(child)) => Ok(Outcome::Done(child)),
            Some(Pick::Create) => self.create_child(prompt, &CreateOptions::default()).await,
            Some(Pick::LoadMore) => {
                self.load_more_children().await?;
                Ok(Outcome::Done(Arc::clone(self)))
            }
            None => Err(TreeError::InvalidSelection(format!(
                "index {index} out of range"
            ))),
        }
    }

    fn is_ancestor_of_any(&self, expected: &[&str]) -> bool {
        expected.iter().any(|tag| self.is_ancestor_of(tag))
    }
}

pub(crate) fn no_match(expected: &[&str]) -> TreeError {
    TreeError::NoMatchingResource(expected.join(", "))
}
