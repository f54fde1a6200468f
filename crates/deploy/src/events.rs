//! Workflow output events.
//!
//! Lines the user should see (deployment progress, deletion status) are
//! sent on a channel owned by the host and mirrored to `tracing`.

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Event emitted by a site workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEvent {
    /// A line for the output channel.
    Log { site: String, message: String },
    /// A deployment finished successfully.
    Completed { site: String },
    /// A deployment failed.
    Failed { site: String, error: String },
}

/// Owns the event channel of a workflow host.
pub struct SiteEvents {
    tx: mpsc::UnboundedSender<SiteEvent>,
    rx: Option<mpsc::UnboundedReceiver<SiteEvent>>,
}

impl Default for SiteEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteEvents {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Some(rx) }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SiteEvent>> {
        self.rx.take()
    }

    /// Handle passed to workflows.
    pub fn log(&self) -> SiteLog {
        SiteLog {
            tx: Some(self.tx.clone()),
        }
    }
}

/// Cloneable sender half used by workflows.
#[derive(Debug, Clone, Default)]
pub struct SiteLog {
    tx: Option<mpsc::UnboundedSender<SiteEvent>>,
}

impl SiteLog {
    /// A log that only writes to `tracing`.
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn line(&self, site: &str, message: impl Into<String>) {
        let message = message.into();
        info!(site, "{message}");
        self.send(SiteEvent::Log {
            site: site.to_string(),
            message,
        });
    }

    pub(crate) fn completed(&self, site: &str) {
        self.send(SiteEvent::Completed {
            site: site.to_string(),
        });
    }

    pub(crate) fn failed(&self, site: &str, error: &str) {
        warn!(site, error, "deployment failed");
        self.send(SiteEvent::Failed {
            site: site.to_string(),
            error: error.to_string(),
        });
    }

    fn send(&self, event: SiteEvent) {
        if let Some(tx) = &self.tx {
            // The host may have stopped listening.
            let _ = tx.send(event);
        }
    }
}
