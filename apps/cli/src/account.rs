//! Account state from the environment.

use appservice_tree::{AccountState, AccountStatus, SubscriptionInfo};

/// Parses `id[=name]` entries separated by commas.
pub fn parse_subscriptions(raw: &str) -> Vec<SubscriptionInfo> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) => SubscriptionInfo::new(id.trim(), name.trim()),
            None => SubscriptionInfo::new(entry, ""),
        })
        .collect()
}

/// Signed in when a token is present; the filter is the given subscriptions.
pub fn account_state(token: Option<&str>, subscriptions: &[SubscriptionInfo]) -> AccountState {
    match token.filter(|t| !t.is_empty()) {
        Some(_) => AccountState::logged_in(subscriptions.to_vec()),
        None => AccountState::new(AccountStatus::LoggedOut),
    }
}
