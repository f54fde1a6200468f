//! Tree error types.

/// Errors produced while loading, creating or picking tree nodes.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A resource failed to produce its children or a new child.
    #[error("{0}")]
    Resource(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The node does not have the requested capability.
    #[error("\"{label}\" does not support {capability}")]
    NotImplemented {
        label: String,
        capability: &'static str,
    },

    #[error("no matching resources found: {0}")]
    NoMatchingResource(String),

    #[error("not signed in to an Azure account")]
    NotSignedIn,

    #[error("no subscriptions selected")]
    NoSubscriptions,

    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl TreeError {
    /// Wraps an error raised by a resource implementation.
    pub fn resource<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TreeError::Resource(Box::new(err))
    }
}
