//! App Service management and deployment API surface.
//!
//! This crate holds the **wire types** exchanged with the Azure resource
//! manager and the Kudu deployment service, the collaborator traits the
//! rest of the workspace is written against, and reqwest-backed
//! implementations of those traits.
//!
//! # Collaborators
//!
//! - [`WebSiteManagement`]: sites, slots, configuration, plans, settings
//! - [`DeploymentService`]: zip push deploy and deployment status
//! - [`BlobStorage`]: containers, uploads and shared-access URLs

pub mod arm;
pub mod blob;
pub mod error;
pub mod kudu;
pub mod management;
pub mod resource_id;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export primary types for convenience.
pub use arm::ArmClient;
pub use blob::{BlobClient, SharedKeyBlobFactory};
pub use error::ClientError;
pub use kudu::{DeploymentService, DeploymentServiceFactory, KuduClient, KuduConnector};
pub use management::WebSiteManagement;
pub use resource_id::ResourceId;
pub use storage::{BlobStorage, BlobStorageFactory, StorageConnectionString};
pub use types::{
    AppServicePlan, DeployResult, DeployStatus, Page, PublishingCredentials, ScmType, Site,
    SiteConfig, SiteProperties, SiteSourceControl, StringDictionary,
};
