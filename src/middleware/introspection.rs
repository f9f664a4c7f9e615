use axum::Json;
use axum::extract::State;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::flow::CALLBACK_PATH;
use super::state::AuthState;
use super::traits::{PendingRequestStore, SessionStore};

/// Presence of each required IdP configuration key. Never carries values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequiredConfig {
    #[serde(rename = "AUTH0_SECRET")]
    pub secret: bool,
    #[serde(rename = "AUTH0_DOMAIN")]
    pub domain: bool,
    #[serde(rename = "AUTH0_CLIENT_ID")]
    pub client_id: bool,
    #[serde(rename = "AUTH0_CLIENT_SECRET")]
    pub client_secret: bool,
    #[serde(rename = "APP_BASE_URL")]
    pub base_url: bool,
}

impl RequiredConfig {
    pub(super) fn all_present() -> Self {
        Self {
            secret: true,
            domain: true,
            client_id: true,
            client_secret: true,
            base_url: true,
        }
    }

    /// Names of the keys that are absent.
    pub(super) fn missing(self) -> impl Iterator<Item = &'static str> {
        [
            ("AUTH0_SECRET", self.secret),
            ("AUTH0_DOMAIN", self.domain),
            ("AUTH0_CLIENT_ID", self.client_id),
            ("AUTH0_CLIENT_SECRET", self.client_secret),
            ("APP_BASE_URL", self.base_url),
        ]
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConfigReport {
    timestamp: String,
    environment: String,
    required_config: RequiredConfig,
    issues: Vec<String>,
    callback_path: &'static str,
}

/// `GET /api/auth0/test-config`: configuration health without secrets.
pub(super) async fn test_config<P, S>(State(state): State<AuthState<P, S>>) -> Json<ConfigReport>
where
    P: PendingRequestStore,
    S: SessionStore,
{
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(ConfigReport {
        timestamp,
        environment: state.status.environment.clone(),
        required_config: state.status.required,
        issues: state.status.issues.clone(),
        callback_path: CALLBACK_PATH,
    })
}
