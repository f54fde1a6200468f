//! Mock collaborators shared by the workflow tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use appservice_client::{
    AppServicePlan, BlobStorage, BlobStorageFactory, ClientError, DeployResult, DeploymentService,
    DeploymentServiceFactory, Page, PublishingCredentials, ScmType, Site, SiteConfig,
    SiteProperties, SiteSourceControl, StorageConnectionString, StringDictionary,
    WebSiteManagement,
};
use appservice_tree::{InputBoxOptions, MessageLevel, QuickPickItem, UserPrompt};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use crate::git::{GitClient, GitError};

const SITE_ID: &str = "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/sites/contoso";
const PLAN_ID: &str =
    "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/serverfarms/plan1";

pub(crate) fn production_site() -> Site {
    Site {
        id: SITE_ID.into(),
        name: "contoso".into(),
        resource_type: "Microsoft.Web/sites".into(),
        location: "West Europe".into(),
        kind: Some("app".into()),
        properties: SiteProperties {
            state: "Running".into(),
            default_host_name: "contoso.azurewebsites.net".into(),
            server_farm_id: PLAN_ID.into(),
            resource_group: "rg1".into(),
            ..SiteProperties::default()
        },
    }
}

pub(crate) fn slot_site() -> Site {
    Site {
        id: format!("{SITE_ID}/slots/staging"),
        name: "contoso/staging".into(),
        resource_type: "Microsoft.Web/sites/slots".into(),
        properties: SiteProperties {
            default_host_name: "contoso-staging.azurewebsites.net".into(),
            ..production_site().properties
        },
        ..production_site()
    }
}

fn canned<T>(value: T) -> BoxFuture<'static, Result<T, ClientError>>
where
    T: Send + 'static,
{
    Box::pin(async move { Ok(value) })
}

/// Management client with configurable state that records every call.
pub(crate) struct MockManagement {
    config: Mutex<SiteConfig>,
    plan_sites: Mutex<i32>,
    app_settings: Mutex<StringDictionary>,
    calls: Mutex<Vec<String>>,
    updated_config: Mutex<Option<SiteConfig>>,
    updated_source_control: Mutex<Option<SiteSourceControl>>,
    updated_app_settings: Mutex<Option<StringDictionary>>,
    deleted: Mutex<Option<bool>>,
}

impl Default for MockManagement {
    fn default() -> Self {
        let mut config = SiteConfig::default();
        config
            .extra
            .insert("numberOfWorkers".into(), serde_json::json!(1));
        Self {
            config: Mutex::new(config),
            plan_sites: Mutex::new(3),
            app_settings: Mutex::new(StringDictionary::default()),
            calls: Mutex::new(Vec::new()),
            updated_config: Mutex::new(None),
            updated_source_control: Mutex::new(None),
            updated_app_settings: Mutex::new(None),
            deleted: Mutex::new(None),
        }
    }
}

impl MockManagement {
    pub(crate) fn with_scm_type(self, scm_type: ScmType) -> Self {
        self.config.lock().unwrap().scm_type = scm_type;
        self
    }

    pub(crate) fn with_plan_sites(self, count: i32) -> Self {
        *self.plan_sites.lock().unwrap() = count;
        self
    }

    pub(crate) fn set_app_setting(&self, key: &str, value: &str) {
        self.app_settings
            .lock()
            .unwrap()
            .properties
            .insert(key.into(), value.into());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn updated_config(&self) -> Option<SiteConfig> {
        self.updated_config.lock().unwrap().clone()
    }

    pub(crate) fn updated_source_control(&self) -> Option<SiteSourceControl> {
        self.updated_source_control.lock().unwrap().clone()
    }

    pub(crate) fn updated_app_settings(&self) -> Option<StringDictionary> {
        self.updated_app_settings.lock().unwrap().clone()
    }

    /// The `delete_empty_server_farm` flag of the delete call, if any.
    pub(crate) fn deleted(&self) -> Option<bool> {
        *self.deleted.lock().unwrap()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl WebSiteManagement for MockManagement {
    fn list_web_apps<'a>(
        &'a self,
        _next_link: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Page<Site>, ClientError>> {
        self.record("list_web_apps");
        canned(Page {
            value: vec![production_site()],
            next_link: None,
        })
    }

    fn list_slots<'a>(&'a self, _site: &'a Site) -> BoxFuture<'a, Result<Vec<Site>, ClientError>> {
        self.record("list_slots");
        canned(vec![slot_site()])
    }

    fn get_site_config<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        self.record("get_site_config");
        canned(self.config.lock().unwrap().clone())
    }

    fn update_site_config<'a>(
        &'a self,
        _site: &'a Site,
        config: &'a SiteConfig,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        self.record("update_site_config");
        *self.updated_config.lock().unwrap() = Some(config.clone());
        *self.config.lock().unwrap() = config.clone();
        canned(config.clone())
    }

    fn update_source_control<'a>(
        &'a self,
        _site: &'a Site,
        source_control: &'a SiteSourceControl,
    ) -> BoxFuture<'a, Result<SiteSourceControl, ClientError>> {
        self.record("update_source_control");
        *self.updated_source_control.lock().unwrap() = Some(source_control.clone());
        canned(source_control.clone())
    }

    fn get_app_service_plan<'a>(
        &'a self,
        plan_id: &'a str,
    ) -> BoxFuture<'a, Result<AppServicePlan, ClientError>> {
        self.record("get_app_service_plan");
        let plan: Result<AppServicePlan, _> = serde_json::from_value(serde_json::json!({
            "id": plan_id,
            "name": "plan1",
            "properties": { "numberOfSites": *self.plan_sites.lock().unwrap() }
        }));
        Box::pin(async move { Ok(plan?) })
    }

    fn delete_site<'a>(
        &'a self,
        _site: &'a Site,
        delete_empty_server_farm: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        self.record("delete_site");
        *self.deleted.lock().unwrap() = Some(delete_empty_server_farm);
        canned(())
    }

    fn publishing_credentials<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<PublishingCredentials, ClientError>> {
        self.record("publishing_credentials");
        canned(PublishingCredentials {
            publishing_user_name: "$contoso".into(),
            publishing_password: "secret".into(),
            scm_uri: None,
        })
    }

    fn list_application_settings<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        self.record("list_application_settings");
        canned(self.app_settings.lock().unwrap().clone())
    }

    fn update_application_settings<'a>(
        &'a self,
        _site: &'a Site,
        settings: &'a StringDictionary,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        self.record("update_application_settings");
        *self.updated_app_settings.lock().unwrap() = Some(settings.clone());
        canned(settings.clone())
    }

    fn create_slot<'a>(
        &'a self,
        _site: &'a Site,
        _slot_name: &'a str,
        _config_source: Option<&'a SiteConfig>,
    ) -> BoxFuture<'a, Result<Site, ClientError>> {
        self.record("create_slot");
        canned(slot_site())
    }
}

/// A recorded zip push.
#[derive(Debug, Clone)]
pub(crate) struct RecordedPush {
    pub(crate) path: PathBuf,
    pub(crate) existed_at_push: bool,
}

#[derive(Default)]
struct DeploymentState {
    results: VecDeque<DeployResult>,
    pushes: Vec<RecordedPush>,
    polled: Vec<String>,
    fail_push: bool,
}

/// Deployment service factory handing out a single shared mock service.
#[derive(Default, Clone)]
pub(crate) struct MockDeployments {
    state: Arc<Mutex<DeploymentState>>,
}

impl MockDeployments {
    /// Queues results returned by successive status polls.
    pub(crate) fn push_results(&self, results: Vec<DeployResult>) {
        self.state.lock().unwrap().results.extend(results);
    }

    pub(crate) fn fail_push(&self) {
        self.state.lock().unwrap().fail_push = true;
    }

    pub(crate) fn pushes(&self) -> Vec<RecordedPush> {
        self.state.lock().unwrap().pushes.clone()
    }

    pub(crate) fn polled_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().polled.clone()
    }
}

impl DeploymentServiceFactory for MockDeployments {
    fn connect(
        &self,
        scm_host: &str,
        credentials: &PublishingCredentials,
    ) -> Result<Arc<dyn DeploymentService>, ClientError> {
        assert_eq!(scm_host, "contoso.scm.azurewebsites.net");
        assert_eq!(credentials.publishing_user_name, "$contoso");
        Ok(Arc::new(self.clone()))
    }
}

impl DeploymentService for MockDeployments {
    fn zip_push_deploy<'a>(
        &'a self,
        zip_path: &'a Path,
        _is_async: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        let mut state = self.state.lock().unwrap();
        state.pushes.push(RecordedPush {
            path: zip_path.to_path_buf(),
            existed_at_push: zip_path.exists(),
        });
        let result = if state.fail_push {
            Err(ClientError::Api {
                status: 500,
                message: "Internal Server Error".into(),
            })
        } else {
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn deploy_result<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<DeployResult, ClientError>> {
        let mut state = self.state.lock().unwrap();
        state.polled.push(id.to_string());
        let result = state.results.pop_front().unwrap_or_else(|| DeployResult {
            id: id.to_string(),
            complete: true,
            status: 4,
            ..DeployResult::default()
        });
        Box::pin(async move { Ok(result) })
    }
}

/// A recorded git push.
#[derive(Debug, Clone)]
pub(crate) struct RecordedGitPush {
    pub(crate) remote: String,
    pub(crate) refspec: String,
    pub(crate) force: bool,
}

#[derive(Default)]
pub(crate) struct MockGit {
    dirty: Mutex<bool>,
    missing: Mutex<bool>,
    reject_next: Mutex<bool>,
    pushes: Mutex<Vec<RecordedGitPush>>,
}

impl MockGit {
    pub(crate) fn set_dirty(&self, dirty: bool) {
        *self.dirty.lock().unwrap() = dirty;
    }

    pub(crate) fn set_missing(&self) {
        *self.missing.lock().unwrap() = true;
    }

    pub(crate) fn reject_next_push(&self) {
        *self.reject_next.lock().unwrap() = true;
    }

    pub(crate) fn pushes(&self) -> Vec<RecordedGitPush> {
        self.pushes.lock().unwrap().clone()
    }
}

impl GitClient for MockGit {
    fn has_uncommitted_changes<'a>(&'a self, _repo: &'a Path) -> BoxFuture<'a, Result<bool, GitError>> {
        let result = if *self.missing.lock().unwrap() {
            Err(GitError::NotInstalled)
        } else {
            Ok(*self.dirty.lock().unwrap())
        };
        Box::pin(async move { result })
    }

    fn push<'a>(
        &'a self,
        _repo: &'a Path,
        remote_url: &'a str,
        refspec: &'a str,
        force: bool,
    ) -> BoxFuture<'a, Result<(), GitError>> {
        if *self.missing.lock().unwrap() {
            return Box::pin(async { Err(GitError::NotInstalled) });
        }
        self.pushes.lock().unwrap().push(RecordedGitPush {
            remote: remote_url.to_string(),
            refspec: refspec.to_string(),
            force,
        });
        let rejected = std::mem::take(&mut *self.reject_next.lock().unwrap());
        Box::pin(async move {
            if rejected {
                Err(GitError::Rejected("! [rejected] HEAD -> master (fetch first)".into()))
            } else {
                Ok(())
            }
        })
    }
}

/// A recorded blob upload.
#[derive(Debug, Clone)]
pub(crate) struct RecordedUpload {
    pub(crate) container: String,
    pub(crate) blob_name: String,
    pub(crate) path: PathBuf,
}

#[derive(Default, Clone)]
pub(crate) struct MockStorage {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
}

impl MockStorage {
    pub(crate) fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl BlobStorageFactory for MockStorage {
    fn connect(
        &self,
        connection: &StorageConnectionString,
    ) -> Result<Arc<dyn BlobStorage>, ClientError> {
        assert_eq!(connection.account_name, "store");
        Ok(Arc::new(self.clone()))
    }
}

impl BlobStorage for MockStorage {
    fn ensure_container<'a>(&'a self, _container: &'a str) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(async { Ok(()) })
    }

    fn upload_file<'a>(
        &'a self,
        container: &'a str,
        blob_name: &'a str,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            container: container.to_string(),
            blob_name: blob_name.to_string(),
            path: path.to_path_buf(),
        });
        Box::pin(async { Ok(()) })
    }

    fn read_sas_url(
        &self,
        container: &str,
        blob_name: &str,
        _start: DateTime<Utc>,
        _expiry: DateTime<Utc>,
    ) -> Result<String, ClientError> {
        Ok(format!(
            "https://store.blob.core.windows.net/{container}/{blob_name}?sp=r&sig=x"
        ))
    }
}

/// Prompt answering from queues and recording what was shown.
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    picks: Mutex<VecDeque<Option<usize>>>,
    messages: Mutex<VecDeque<Option<usize>>>,
    inputs: Mutex<VecDeque<Option<String>>>,
    shown_picks: Mutex<Vec<Vec<QuickPickItem>>>,
    shown_messages: Mutex<Vec<String>>,
    rejected_inputs: Mutex<Vec<String>>,
    opened_urls: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub(crate) fn with_picks(self, picks: Vec<Option<usize>>) -> Self {
        *self.picks.lock().unwrap() = picks.into();
        self
    }

    /// Button indices returned by successive message dialogs.
    pub(crate) fn with_messages(self, answers: Vec<Option<usize>>) -> Self {
        *self.messages.lock().unwrap() = answers.into();
        self
    }

    pub(crate) fn with_inputs(self, inputs: Vec<Option<&str>>) -> Self {
        *self.inputs.lock().unwrap() = inputs
            .into_iter()
            .map(|i| i.map(String::from))
            .collect();
        self
    }

    pub(crate) fn shown_picks(&self) -> Vec<Vec<QuickPickItem>> {
        self.shown_picks.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.shown_messages.lock().unwrap().clone()
    }

    /// Validator messages for inputs that failed validation.
    pub(crate) fn rejected_inputs(&self) -> Vec<String> {
        self.rejected_inputs.lock().unwrap().clone()
    }

    pub(crate) fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().unwrap().clone()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn show_quick_pick<'a>(
        &'a self,
        items: &'a [QuickPickItem],
        _placeholder: &'a str,
    ) -> BoxFuture<'a, Option<usize>> {
        self.shown_picks.lock().unwrap().push(items.to_vec());
        let answer = self.picks.lock().unwrap().pop_front().flatten();
        Box::pin(async move { answer })
    }

    fn show_message<'a>(
        &'a self,
        _level: MessageLevel,
        message: &'a str,
        _buttons: &'a [&'a str],
    ) -> BoxFuture<'a, Option<usize>> {
        self.shown_messages.lock().unwrap().push(message.to_string());
        let answer = self.messages.lock().unwrap().pop_front().flatten();
        Box::pin(async move { answer })
    }

    fn show_input_box<'a>(&'a self, options: &'a InputBoxOptions) -> BoxFuture<'a, Option<String>> {
        // Inputs failing validation are skipped, like a user retyping.
        let mut inputs = self.inputs.lock().unwrap();
        let answer = loop {
            match inputs.pop_front() {
                None | Some(None) => break None,
                Some(Some(text)) => match options.check(&text) {
                    Some(reason) => self.rejected_inputs.lock().unwrap().push(reason),
                    None => break Some(text),
                },
            }
        };
        Box::pin(async move { answer })
    }

    fn open_url(&self, url: &str) {
        self.opened_urls.lock().unwrap().push(url.to_string());
    }
}
