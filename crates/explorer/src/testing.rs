//! Mock management client and prompt for the resource tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use appservice_client::{
    AppServicePlan, ClientError, Page, PublishingCredentials, Site, SiteConfig, SiteProperties,
    SiteSourceControl, StringDictionary, WebSiteManagement,
};
use appservice_tree::{InputBoxOptions, MessageLevel, QuickPickItem, UserPrompt};
use futures_util::future::BoxFuture;

fn site_id(name: &str) -> String {
    format!("/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/sites/{name}")
}

pub(crate) fn web_app(name: &str) -> Site {
    Site {
        id: site_id(name),
        name: name.into(),
        resource_type: "Microsoft.Web/sites".into(),
        location: "West Europe".into(),
        kind: Some("app".into()),
        properties: SiteProperties {
            state: "Running".into(),
            default_host_name: format!("{name}.azurewebsites.net"),
            resource_group: "rg1".into(),
            ..SiteProperties::default()
        },
    }
}

pub(crate) fn function_app(name: &str) -> Site {
    Site {
        kind: Some("functionapp,linux".into()),
        ..web_app(name)
    }
}

fn slot_of(site: &Site, slot: &str) -> Site {
    Site {
        id: format!("{}/slots/{slot}", site.id),
        name: format!("{}/{slot}", site.name),
        resource_type: "Microsoft.Web/sites/slots".into(),
        ..site.clone()
    }
}

fn unsupported<T>() -> BoxFuture<'static, Result<T, ClientError>> {
    Box::pin(async {
        Err(ClientError::Api {
            status: 404,
            message: "not used by the tree".into(),
        })
    })
}

/// Management client serving canned pages and recording list and create calls.
#[derive(Default)]
pub(crate) struct MockManagement {
    pages: Vec<Vec<Site>>,
    fail_list: bool,
    app_settings: Mutex<StringDictionary>,
    listed_links: Mutex<Vec<Option<String>>>,
    created_slot: Mutex<Option<(String, Option<SiteConfig>)>>,
}

impl MockManagement {
    /// Pages linked as `page-1`, `page-2`, ...
    pub(crate) fn with_pages(mut self, pages: Vec<Vec<Site>>) -> Self {
        self.pages = pages;
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub(crate) fn set_app_setting(&self, key: &str, value: &str) {
        self.app_settings
            .lock()
            .unwrap()
            .properties
            .insert(key.into(), value.into());
    }

    pub(crate) fn listed_links(&self) -> Vec<Option<String>> {
        self.listed_links.lock().unwrap().clone()
    }

    /// Name and configuration source of the created slot.
    pub(crate) fn created_slot(&self) -> Option<(String, Option<SiteConfig>)> {
        self.created_slot.lock().unwrap().clone()
    }
}

impl WebSiteManagement for MockManagement {
    fn list_web_apps<'a>(
        &'a self,
        next_link: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Page<Site>, ClientError>> {
        self.listed_links
            .lock()
            .unwrap()
            .push(next_link.map(String::from));
        if self.fail_list {
            return Box::pin(async {
                Err(ClientError::Api {
                    status: 403,
                    message: "AuthorizationFailed".into(),
                })
            });
        }

        let index = next_link
            .and_then(|l| l.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let page = Page {
            value: self.pages.get(index).cloned().unwrap_or_default(),
            next_link: (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1)),
        };
        Box::pin(async move { Ok(page) })
    }

    fn list_slots<'a>(&'a self, site: &'a Site) -> BoxFuture<'a, Result<Vec<Site>, ClientError>> {
        let slots = vec![slot_of(site, "staging")];
        Box::pin(async move { Ok(slots) })
    }

    fn get_site_config<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        let mut config = SiteConfig::default();
        config.extra.insert("alwaysOn".into(), serde_json::json!(true));
        Box::pin(async move { Ok(config) })
    }

    fn update_site_config<'a>(
        &'a self,
        _site: &'a Site,
        _config: &'a SiteConfig,
    ) -> BoxFuture<'a, Result<SiteConfig, ClientError>> {
        unsupported()
    }

    fn update_source_control<'a>(
        &'a self,
        _site: &'a Site,
        _source_control: &'a SiteSourceControl,
    ) -> BoxFuture<'a, Result<SiteSourceControl, ClientError>> {
        unsupported()
    }

    fn get_app_service_plan<'a>(
        &'a self,
        _plan_id: &'a str,
    ) -> BoxFuture<'a, Result<AppServicePlan, ClientError>> {
        unsupported()
    }

    fn delete_site<'a>(
        &'a self,
        _site: &'a Site,
        _delete_empty_server_farm: bool,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        unsupported()
    }

    fn publishing_credentials<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<PublishingCredentials, ClientError>> {
        unsupported()
    }

    fn list_application_settings<'a>(
        &'a self,
        _site: &'a Site,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        let settings = self.app_settings.lock().unwrap().clone();
        Box::pin(async move { Ok(settings) })
    }

    fn update_application_settings<'a>(
        &'a self,
        _site: &'a Site,
        _settings: &'a StringDictionary,
    ) -> BoxFuture<'a, Result<StringDictionary, ClientError>> {
        unsupported()
    }

    fn create_slot<'a>(
        &'a self,
        site: &'a Site,
        slot_name: &'a str,
        config_source: Option<&'a SiteConfig>,
    ) -> BoxFuture<'a, Result<Site, ClientError>> {
        *self.created_slot.lock().unwrap() =
            Some((slot_name.to_string(), config_source.cloned()));
        let slot = slot_of(site, slot_name);
        Box::pin(async move { Ok(slot) })
    }
}

/// Prompt answering picks and inputs from queues.
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    picks: Mutex<VecDeque<Option<usize>>>,
    inputs: Mutex<VecDeque<String>>,
    shown_picks: Mutex<Vec<Vec<String>>>,
    rejected_inputs: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub(crate) fn with_picks(self, picks: Vec<Option<usize>>) -> Self {
        *self.picks.lock().unwrap() = picks.into();
        self
    }

    pub(crate) fn with_inputs(self, inputs: Vec<Option<&str>>) -> Self {
        *self.inputs.lock().unwrap() = inputs.into_iter().flatten().map(String::from).collect();
        self
    }

    pub(crate) fn shown_picks(&self) -> Vec<Vec<String>> {
        self.shown_picks.lock().unwrap().clone()
    }

    pub(crate) fn rejected_inputs(&self) -> Vec<String> {
        self.rejected_inputs.lock().unwrap().clone()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn show_quick_pick<'a>(
        &'a self,
        items: &'a [QuickPickItem],
        _placeholder: &'a str,
    ) -> BoxFuture<'a, Option<usize>> {
        self.shown_picks
            .lock()
            .unwrap()
            .push(items.iter().map(|i| i.label.clone()).collect());
        let answer = self.picks.lock().unwrap().pop_front().flatten();
        Box::pin(async move { answer })
    }

    fn show_message<'a>(
        &'a self,
        _level: MessageLevel,
        _message: &'a str,
        _buttons: &'a [&'a str],
    ) -> BoxFuture<'a, Option<usize>> {
        Box::pin(async { None })
    }

    fn show_input_box<'a>(&'a self, options: &'a InputBoxOptions) -> BoxFuture<'a, Option<String>> {
        let mut inputs = self.inputs.lock().unwrap();
        let answer = loop {
            let Some(text) = inputs.pop_front() else {
                break None;
            };
            match options.check(&text) {
                Some(reason) => self.rejected_inputs.lock().unwrap().push(reason),
                None => break Some(text),
            }
        };
        Box::pin(async move { answer })
    }

    fn open_url(&self, _url: &str) {}
}
