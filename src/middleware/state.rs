use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::classify::RouteTable;
use super::config::{AuthSettings, ConfigStatus};
use super::traits::{PendingRequestStore, SessionStore};
use crate::oauth::AuthClient;

/// Shared state for the front door's handlers and access guard.
pub(super) struct AuthState<P, S> {
    /// `None` when the IdP is not configured.
    pub(super) client: Option<Arc<AuthClient>>,
    pub(super) pending: Arc<P>,
    pub(super) sessions: Arc<S>,
    pub(super) settings: AuthSettings,
    pub(super) routes: Arc<RouteTable>,
    pub(super) status: Arc<ConfigStatus>,
}

// Manual Clone: avoid derive adding `P: Clone, S: Clone` bounds.
impl<P, S> Clone for AuthState<P, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            pending: self.pending.clone(),
            sessions: self.sessions.clone(),
            settings: self.settings.clone(),
            routes: self.routes.clone(),
            status: self.status.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<P: PendingRequestStore, S: SessionStore> FromRef<AuthState<P, S>> for Key {
    fn from_ref(state: &AuthState<P, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
