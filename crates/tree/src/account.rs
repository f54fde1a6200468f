//! Account and subscription state consumed by the tree provider.

use std::sync::Mutex;

use tokio::sync::broadcast;

/// Sign-in status of the account provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Initializing,
    LoggingIn,
    LoggedIn,
    LoggedOut,
}

/// A subscription selected in the account filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub subscription_id: String,
    pub display_name: String,
    pub tenant_id: Option<String>,
}

impl SubscriptionInfo {
    pub fn new(subscription_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            display_name: display_name.into(),
            tenant_id: None,
        }
    }
}

/// Change notification from an [`AccountProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    StatusChanged(AccountStatus),
    FiltersChanged,
}

/// Source of sign-in status and the subscription filter.
pub trait AccountProvider: Send + Sync {
    fn status(&self) -> AccountStatus;

    fn filters(&self) -> Vec<SubscriptionInfo>;

    /// Subscribes to status and filter changes.
    fn subscribe(&self) -> broadcast::Receiver<AccountEvent>;
}

/// In-memory [`AccountProvider`] driven by the host.
pub struct AccountState {
    inner: Mutex<AccountInner>,
    events: broadcast::Sender<AccountEvent>,
}

struct AccountInner {
    status: AccountStatus,
    filters: Vec<SubscriptionInfo>,
}

impl AccountState {
    pub fn new(status: AccountStatus) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(AccountInner {
                status,
                filters: Vec::new(),
            }),
            events,
        }
    }

    /// A signed-in account with the given subscriptions selected.
    pub fn logged_in(filters: Vec<SubscriptionInfo>) -> Self {
        let state = Self::new(AccountStatus::LoggedIn);
        state.lock().filters = filters;
        state
    }

    pub fn set_status(&self, status: AccountStatus) {
        {
            let mut inner = self.lock();
            if inner.status == status {
                return;
            }
            inner.status = status;
        }
        // No receivers is fine.
        let _ = self.events.send(AccountEvent::StatusChanged(status));
    }

    pub fn set_filters(&self, filters: Vec<SubscriptionInfo>) {
        self.lock().filters = filters;
        let _ = self.events.send(AccountEvent::FiltersChanged);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AccountInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AccountProvider for AccountState {
    fn status(&self) -> AccountStatus {
        self.lock().status
    }

    fn filters(&self) -> Vec<SubscriptionInfo> {
        self.lock().filters.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.events.subscribe()
    }
}
