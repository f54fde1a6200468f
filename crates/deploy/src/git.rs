//! Local git collaborator used by local-git deployments.

use std::path::Path;
use std::process::Output;

use appservice_client::PublishingCredentials;
use futures_util::future::BoxFuture;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::process::Command;
use tracing::debug;

/// Git failures the deploy workflow tells apart.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The `git` executable could not be started.
    #[error("git is not installed")]
    NotInstalled,

    /// The remote refused the push because histories diverged.
    #[error("push rejected: {0}")]
    Rejected(String),

    #[error("git failed: {0}")]
    Failed(String),
}

/// Operations on a local repository.
pub trait GitClient: Send + Sync {
    /// Whether the working tree has uncommitted changes.
    fn has_uncommitted_changes<'a>(&'a self, repo: &'a Path)
    -> BoxFuture<'a, Result<bool, GitError>>;

    /// Pushes `refspec` to `remote_url`.
    fn push<'a>(
        &'a self,
        repo: &'a Path,
        remote_url: &'a str,
        refspec: &'a str,
        force: bool,
    ) -> BoxFuture<'a, Result<(), GitError>>;
}

/// Runs the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct CommandGit;

impl CommandGit {
    async fn run(repo: &Path, args: &[&str]) -> Result<Output, GitError> {
        Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => GitError::NotInstalled,
                _ => GitError::Failed(e.to_string()),
            })
    }

    async fn status(repo: &Path) -> Result<bool, GitError> {
        let output = Self::run(repo, &["status", "--porcelain"]).await?;
        if !output.status.success() {
            return Err(GitError::Failed(stderr_text(&output)));
        }
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    async fn push_to(repo: &Path, remote_url: &str, refspec: &str, force: bool) -> Result<(), GitError> {
        let mut args = vec!["push", remote_url, refspec];
        if force {
            args.push("-f");
        }
        debug!(repo = %repo.display(), refspec, force, "pushing");
        let output = Self::run(repo, &args).await?;
        if output.status.success() {
            return Ok(());
        }
        Err(classify_push_failure(&stderr_text(&output)))
    }
}

impl GitClient for CommandGit {
    fn has_uncommitted_changes<'a>(
        &'a self,
        repo: &'a Path,
    ) -> BoxFuture<'a, Result<bool, GitError>> {
        Box::pin(Self::status(repo))
    }

    fn push<'a>(
        &'a self,
        repo: &'a Path,
        remote_url: &'a str,
        refspec: &'a str,
        force: bool,
    ) -> BoxFuture<'a, Result<(), GitError>> {
        Box::pin(Self::push_to(repo, remote_url, refspec, force))
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn classify_push_failure(stderr: &str) -> GitError {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("[rejected]") || lower.contains("non-fast-forward") || lower.contains("fetch first") {
        GitError::Rejected(stderr.to_string())
    } else {
        GitError::Failed(stderr.to_string())
    }
}

/// Remote URL of a site's repository with the publishing credentials
/// embedded: `https://{user}:{password}@{scm_host}:443/{repo}.git`.
pub fn remote_url(credentials: &PublishingCredentials, scm_host: &str, repository: &str) -> String {
    let user = utf8_percent_encode(&credentials.publishing_user_name, NON_ALPHANUMERIC);
    let password = utf8_percent_encode(&credentials.publishing_password, NON_ALPHANUMERIC);
    format!("https://{user}:{password}@{scm_host}:443/{repository}.git")
}
