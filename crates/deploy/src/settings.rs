//! Persisted workflow settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SiteError;

const SETTINGS_DIR: &str = "appservice";
const SETTINGS_FILE: &str = "settings.json";

/// How a zip package reaches the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZipDeployStrategy {
    /// Push the package to the deployment service and poll until done.
    #[default]
    Push,
    /// Upload the package to blob storage and point the site at it.
    RunFromBlob,
}

/// User settings for site workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ask before overwriting a site with a zip deployment.
    pub show_deploy_confirmation: bool,
    /// Seconds between deployment status polls.
    pub deploy_poll_interval_secs: u64,
    /// Glob patterns excluded when zipping a folder.
    pub zip_ignore_patterns: Vec<String>,
    pub zip_deploy_strategy: ZipDeployStrategy,
    /// Container receiving run-from-blob packages.
    pub run_from_blob_container: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_deploy_confirmation: true,
            deploy_poll_interval_secs: 5,
            zip_ignore_patterns: Vec::new(),
            zip_deploy_strategy: ZipDeployStrategy::Push,
            run_from_blob_container: "azureappservice-run-from-zip".into(),
        }
    }
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self, SiteError> {
        Self::load_from(&settings_path())
    }

    /// Loads settings from `path`. A missing file yields defaults, an
    /// unreadable one yields defaults with a warning.
    pub fn load_from(path: &Path) -> Result<Self, SiteError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse settings, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<(), SiteError> {
        self.save_to(&settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SiteError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Delay between deployment status checks, never below one second.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.deploy_poll_interval_secs.max(1))
    }
}

/// `$XDG_CONFIG_HOME/appservice/settings.json`, falling back to
/// `$HOME/.config`.
pub fn settings_path() -> PathBuf {
    config_base_dir().join(SETTINGS_DIR).join(SETTINGS_FILE)
}

fn config_base_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config")
}
