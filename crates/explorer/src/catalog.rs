//! Sites and slots seen while loading the tree, by resource id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use appservice_client::{Site, WebSiteManagement};

struct Entry {
    site: Site,
    client: Arc<dyn WebSiteManagement>,
}

/// Sites and slots seen by the tree, keyed by resource id.
///
/// Node ids of sites and slots are their resource ids, so a picked node's
/// id finds the site and the client of its subscription.
#[derive(Clone, Default)]
pub struct SiteCatalog {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SiteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, site: &Site, client: &Arc<dyn WebSiteManagement>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                site.id.to_ascii_lowercase(),
                Entry {
                    site: site.clone(),
                    client: Arc::clone(client),
                },
            );
    }

    /// Looks up a site or slot by resource id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<(Site, Arc<dyn WebSiteManagement>)> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id.to_ascii_lowercase())
            .map(|e| (e.site.clone(), Arc::clone(&e.client)))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
