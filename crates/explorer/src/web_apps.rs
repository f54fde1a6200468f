//! Web apps of a subscription.

use std::sync::{Arc, Mutex};

use appservice_client::{ClientError, Site, WebSiteManagement};
use appservice_tree::{
    ChildProvider, ChildProviderFactory, Resource, SubscriptionInfo, TreeError,
};
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::catalog::SiteCatalog;
use crate::site::SiteTreeItem;

/// Builds the management client of a subscription.
pub type ClientBuilder =
    Box<dyn Fn(&SubscriptionInfo) -> Result<Arc<dyn WebSiteManagement>, ClientError> + Send + Sync>;

/// Paging position in the web app listing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Paging {
    Start,
    Next(String),
    Done,
}

/// Lists the web apps of one subscription, one service page at a time.
///
/// Function apps share the listing and are skipped.
pub struct WebAppProvider {
    client: Arc<dyn WebSiteManagement>,
    catalog: SiteCatalog,
    paging: Mutex<Paging>,
}

impl WebAppProvider {
    pub fn new(client: Arc<dyn WebSiteManagement>, catalog: SiteCatalog) -> Self {
        Self {
            client,
            catalog,
            paging: Mutex::new(Paging::Start),
        }
    }

    fn paging(&self) -> Paging {
        self.paging.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_paging(&self, paging: Paging) {
        *self.paging.lock().unwrap_or_else(|e| e.into_inner()) = paging;
    }

    async fn next_page(&self, clear_cache: bool) -> Result<Vec<Resource>, TreeError> {
        if clear_cache {
            self.set_paging(Paging::Start);
        }
        let next_link = match self.paging() {
            Paging::Start => None,
            Paging::Next(link) => Some(link),
            Paging::Done => return Ok(Vec::new()),
        };

        let page = self
            .client
            .list_web_apps(next_link.as_deref())
            .await
            .map_err(TreeError::resource)?;
        self.set_paging(match page.next_link {
            Some(link) if !link.is_empty() => Paging::Next(link),
            _ => Paging::Done,
        });

        let total = page.value.len();
        let apps: Vec<Resource> = page
            .value
            .into_iter()
            .filter(|site| !is_function_app(site))
            .map(|site| {
                self.catalog.record(&site, &self.client);
                Resource::parent(SiteTreeItem::new(
                    site,
                    Arc::clone(&self.client),
                    self.catalog.clone(),
                ))
            })
            .collect();
        debug!(total, web_apps = apps.len(), "loaded web app page");
        Ok(apps)
    }
}

fn is_function_app(site: &Site) -> bool {
    site.kind
        .as_deref()
        .is_some_and(|kind| kind.to_ascii_lowercase().contains("functionapp"))
}

impl ChildProvider for WebAppProvider {
    fn child_type_label(&self) -> String {
        "Web App".into()
    }

    fn has_more_children(&self) -> bool {
        self.paging() != Paging::Done
    }

    fn load_more_children(
        &self,
        clear_cache: bool,
    ) -> BoxFuture<'_, Result<Vec<Resource>, TreeError>> {
        Box::pin(self.next_page(clear_cache))
    }
}

/// Creates a [`WebAppProvider`] per subscription.
pub struct WebAppProviderFactory {
    build_client: ClientBuilder,
    catalog: SiteCatalog,
}

impl WebAppProviderFactory {
    pub fn new(build_client: ClientBuilder, catalog: SiteCatalog) -> Self {
        Self {
            build_client,
            catalog,
        }
    }
}

impl ChildProviderFactory for WebAppProviderFactory {
    fn for_subscription(
        &self,
        subscription: &SubscriptionInfo,
    ) -> Result<Arc<dyn ChildProvider>, TreeError> {
        let client = (self.build_client)(subscription).map_err(TreeError::resource)?;
        Ok(Arc::new(WebAppProvider::new(client, self.catalog.clone())))
    }
}
