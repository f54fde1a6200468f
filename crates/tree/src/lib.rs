//! Lazy, cached resource tree.
//!
//! This crate adapts an arbitrary resource hierarchy into an incrementally
//! loaded tree for a host UI. It has no knowledge of any concrete cloud
//! resource: each resource type plugs in through [`TreeResource`] and
//! [`ParentResource`], and the host drives the tree through
//! [`TreeDataProvider`].
//!
//! # Pieces
//!
//! - **Resources**: capability traits implemented per resource type
//! - **Nodes**: identity, parent link, cached sorted children and paging
//! - **Pickers**: walk the tree with the user to a node of a given kind
//! - **Provider**: root nodes from account state and change notifications

pub mod account;
pub mod error;
pub mod node;
pub mod outcome;
pub mod picker;
pub mod provider;
pub mod resource;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenience.
pub use account::{AccountEvent, AccountProvider, AccountState, AccountStatus, SubscriptionInfo};
pub use error::TreeError;
pub use node::{CreationProgress, TreeNode};
pub use outcome::Outcome;
pub use provider::{
    AccountWatch, CREATE_ACCOUNT_COMMAND, SELECT_SUBSCRIPTIONS_COMMAND, SIGN_IN_COMMAND,
    TreeDataProvider, TreeEvent, TreeItem,
};
pub use resource::{
    COMMAND_CONTEXT, CREATING_CONTEXT, ChildCreator, ChildProvider, ChildProviderFactory,
    CreateContext, CreateOptions, ERROR_CONTEXT, IconPath, LOAD_MORE_CONTEXT, ParentResource,
    Resource, SUBSCRIPTION_CONTEXT, StaticResource, TreeCommand, TreeResource,
};
pub use ui::{InputBoxOptions, MessageLevel, QuickPickItem, UserPrompt};
