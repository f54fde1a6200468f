//! Workflow error types.

use appservice_client::ClientError;
use appservice_tree::TreeError;

use crate::git::GitError;

/// Errors produced by site workflows.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// The site is configured in a way the workflow cannot handle.
    #[error("{0}")]
    Configuration(String),

    /// The path is neither a zip file nor a folder.
    #[error("path \"{0}\" is not a .zip file or a folder")]
    InvalidDeployPath(String),

    #[error("deployment to \"{site}\" failed: {message}")]
    DeploymentFailed { site: String, message: String },
}
