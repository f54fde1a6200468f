//! Wire types for the management and deployment APIs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::resource_id::ResourceId;

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// A web app or deployment slot as returned by the resource manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    /// `app` for production sites, `app/slot` for slots.
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: SiteProperties,
}

/// Selected `properties` of a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub default_host_name: String,
    #[serde(default)]
    pub enabled_host_names: Vec<String>,
    #[serde(default)]
    pub host_name_ssl_states: Vec<HostNameSslState>,
    #[serde(default)]
    pub server_farm_id: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_site_name: Option<String>,
}

/// Host name binding; the `Repository` entry is the deployment host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNameSslState {
    pub name: String,
    #[serde(default)]
    pub host_type: String,
}

impl Site {
    /// Parses the site id.
    pub fn resource_id(&self) -> Result<ResourceId, ClientError> {
        ResourceId::parse(&self.id)
    }

    /// Whether this is a deployment slot.
    pub fn is_slot(&self) -> bool {
        self.resource_type.to_ascii_lowercase().ends_with("/slots")
    }

    /// Name of the production site (the part before `/` for slots).
    pub fn site_name(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    /// Slot name for deployment slots.
    pub fn slot_name(&self) -> Option<&str> {
        if self.is_slot() {
            self.name.split_once('/').map(|(_, slot)| slot)
        } else {
            None
        }
    }

    /// Host name of the deployment (SCM) endpoint.
    pub fn scm_host(&self) -> String {
        if let Some(state) = self
            .properties
            .host_name_ssl_states
            .iter()
            .find(|s| s.host_type.eq_ignore_ascii_case("Repository"))
        {
            return state.name.clone();
        }
        if let Some(host) = self
            .properties
            .enabled_host_names
            .iter()
            .find(|h| h.contains(".scm."))
        {
            return host.clone();
        }
        match self.properties.default_host_name.split_once('.') {
            Some((app, domain)) => format!("{app}.scm.{domain}"),
            None => format!("{}.scm.azurewebsites.net", self.properties.default_host_name),
        }
    }

    /// Repository name used by local git remotes.
    pub fn repository_name(&self) -> String {
        self.properties
            .repository_site_name
            .clone()
            .unwrap_or_else(|| self.site_name().to_string())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Source control mechanism configured for a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScmType {
    #[default]
    None,
    LocalGit,
    GitHub,
    /// Any type this workspace does not manage (`VSTSRM`, `Dropbox`, ...).
    Other(String),
}

impl ScmType {
    /// The service string for this type.
    pub fn as_str(&self) -> &str {
        match self {
            ScmType::None => "None",
            ScmType::LocalGit => "LocalGit",
            ScmType::GitHub => "GitHub",
            ScmType::Other(s) => s,
        }
    }
}

impl From<String> for ScmType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "None" => ScmType::None,
            "LocalGit" => ScmType::LocalGit,
            "GitHub" => ScmType::GitHub,
            _ => ScmType::Other(value),
        }
    }
}

impl From<ScmType> for String {
    fn from(value: ScmType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ScmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete site configuration (`config/web` properties).
///
/// The backing API does not support partial updates, so unknown fields
/// are carried through `extra` and sent back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub scm_type: ScmType,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Source control binding used when connecting a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSourceControl {
    pub repo_url: String,
    pub branch: String,
    #[serde(default)]
    pub is_manual_integration: bool,
}

/// Application settings of a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringDictionary {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Credentials for the deployment endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingCredentials {
    pub publishing_user_name: String,
    pub publishing_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_uri: Option<String>,
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// App Service plan (server farm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppServicePlan {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<SkuDescription>,
    #[serde(default)]
    pub properties: PlanProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuDescription {
    pub name: String,
    #[serde(default)]
    pub tier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProperties {
    #[serde(default)]
    pub number_of_sites: i32,
}

impl AppServicePlan {
    pub fn number_of_sites(&self) -> i32 {
        self.properties.number_of_sites
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

impl<T> Page<T> {
    pub fn last(value: Vec<T>) -> Self {
        Self {
            value,
            next_link: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

/// Status codes reported by the deployment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStatus {
    Pending,
    Building,
    Deploying,
    Failed,
    Success,
    Unknown(i32),
}

impl DeployStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DeployStatus::Pending,
            1 => DeployStatus::Building,
            2 => DeployStatus::Deploying,
            3 => DeployStatus::Failed,
            4 => DeployStatus::Success,
            other => DeployStatus::Unknown(other),
        }
    }
}

/// A deployment record.
///
/// Until the service assigns a permanent id the `latest` record is a
/// temporary one (`is_temp`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub is_temp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
}

impl DeployResult {
    pub fn deploy_status(&self) -> DeployStatus {
        DeployStatus::from_code(self.status)
    }
}
