use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use super::config::FrontDoorConfig;
use super::cookies;
use super::error::AuthError;
use super::extractor::resolve_session;
use super::flow::{AUTH_ERROR_PATH, CALLBACK_PATH, ErrorReason, FlowEvent, FlowState, LOGIN_PATH};
use super::guard::access_guard;
use super::introspection::test_config;
use super::pages;
use super::state::AuthState;
use super::traits::{PendingRequestStore, SessionStore};
use super::types::{NewSession, PendingAuthRequest, Session};
use crate::types::{ReturnTo, SessionId};

/// Wrap an application router with the front door.
///
/// Adds the login flow, logout, the landing and error pages, the session and
/// config introspection endpoints, and a 404 fallback, then puts every route
/// behind the access guard. `app` must not declare its own fallback.
pub fn front_door<P, S>(
    config: FrontDoorConfig,
    pending: Arc<P>,
    sessions: Arc<S>,
    app: Router,
) -> Router
where
    P: PendingRequestStore,
    S: SessionStore,
{
    let state = AuthState {
        client: config.client.map(Arc::new),
        pending,
        sessions,
        settings: config.settings,
        routes: Arc::new(config.routes),
        status: Arc::new(config.status),
    };

    let auth = Router::new()
        .route("/", get(pages::home))
        .route(AUTH_ERROR_PATH, get(pages::auth_error))
        .route(LOGIN_PATH, get(login::<P, S>))
        .route(CALLBACK_PATH, get(callback::<P, S>))
        .route("/auth/logout", get(logout::<P, S>).post(logout::<P, S>))
        .route("/auth/me", get(me::<P, S>))
        .route("/api/auth0/me", get(me::<P, S>))
        .route("/api/auth0/test-config", get(test_config::<P, S>))
        .with_state(state.clone());

    auth.merge(app)
        .fallback(not_found)
        .layer(from_fn_with_state(state, access_guard::<P, S>))
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<P: PendingRequestStore, S: SessionStore>(
    State(state): State<AuthState<P, S>>,
    RawQuery(query): RawQuery,
) -> Result<Redirect, AuthError> {
    let Some(client) = state.client.as_ref() else {
        return Err(AuthError::Configuration(
            "identity provider settings are incomplete".into(),
        ));
    };

    let return_to = state
        .settings
        .resolve_return_to(query_param(query.as_deref(), "returnTo").as_deref());

    let auth_req = client.authorization_url();
    let now = OffsetDateTime::now_utc();

    state
        .pending
        .insert(PendingAuthRequest {
            state: auth_req.state,
            nonce: auth_req.nonce,
            pkce_verifier: auth_req.code_verifier,
            return_to,
            created_at: now,
            expires_at: now + state.settings.pending_ttl,
        })
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    tracing::debug!("Authorization request issued");
    Ok(Redirect::temporary(&auth_req.url))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Lenient parse: unknown or malformed pairs are ignored, never rejected.
    fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// The callback always ends in one of two places: the recorded `returnTo`
/// with a fresh session cookie, or the error surface.
async fn callback<P: PendingRequestStore, S: SessionStore>(
    State(state): State<AuthState<P, S>>,
    jar: PrivateCookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let params = CallbackParams::parse(query.as_deref());

    let (flow, completed) = match complete_login(&state, params).await {
        Ok(completed) => (FlowState::Pending.on(FlowEvent::Exchanged), Some(completed)),
        Err(e) => {
            tracing::warn!(reason = %e.reason(), error = %e, "Login callback rejected");
            (FlowState::Pending.on(FlowEvent::Rejected(e.reason())), None)
        }
    };

    match (flow, completed) {
        (FlowState::Session, Some((session, return_to))) => {
            tracing::info!(subject = %session.subject, "Login completed");
            let cookie = cookies::session_cookie(
                &state.settings.session_cookie_name,
                &session.id,
                state.settings.session_ttl,
                state.settings.secure_cookies,
            );
            (jar.add(cookie), Redirect::temporary(return_to.as_str())).into_response()
        }
        (FlowState::Error(reason), _) => Redirect::temporary(&reason.location()).into_response(),
        _ => Redirect::temporary(&ErrorReason::Unknown.location()).into_response(),
    }
}

async fn complete_login<P: PendingRequestStore, S: SessionStore>(
    state: &AuthState<P, S>,
    params: CallbackParams,
) -> Result<(Session, ReturnTo), AuthError> {
    // Consume before anything else: whatever happens next, this state is spent.
    let pending = match params.state.as_deref() {
        Some(s) => state
            .pending
            .take(s)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?,
        None => None,
    };

    if let Some(error) = params.error {
        let description = params.error_description.as_deref().unwrap_or("none");
        tracing::warn!(error = %error, description = %description, "Identity provider returned an error");
        return Err(AuthError::ProviderRejected(error));
    }

    let now = OffsetDateTime::now_utc();
    let pending = match pending {
        Some(p) if !p.is_expired_at(now) => p,
        Some(_) => {
            tracing::debug!("Pending authorization request expired");
            return Err(AuthError::InvalidState);
        }
        None => return Err(AuthError::InvalidState),
    };

    let code = params
        .code
        .ok_or_else(|| AuthError::CodeExchange("callback carried no code".into()))?;

    let client = state
        .client
        .as_ref()
        .ok_or_else(|| AuthError::Configuration("identity provider settings are incomplete".into()))?;

    let identity = client
        .redeem(&code, &pending.pkce_verifier, &pending.nonce)
        .await
        .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

    let issued_at = OffsetDateTime::now_utc();
    let session = state
        .sessions
        .create(NewSession {
            subject: identity.subject,
            claims: identity.claims,
            issued_at,
            expires_at: issued_at + state.settings.session_ttl,
        })
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    Ok((session, pending.return_to))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<P: PendingRequestStore, S: SessionStore>(
    State(state): State<AuthState<P, S>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(cookie) = jar.get(&state.settings.session_cookie_name) {
        let session_id = SessionId(cookie.value().to_string());
        if let Err(e) = state.sessions.delete(&session_id).await {
            tracing::warn!(error = %e, "Session deletion failed during logout");
        } else {
            tracing::info!("Logged out");
        }
    }

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    (
        jar.remove(clear_cookie),
        Redirect::temporary(&state.settings.logout_redirect),
    )
}

// ── Session introspection ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

async fn me<P: PendingRequestStore, S: SessionStore>(
    State(state): State<AuthState<P, S>>,
    jar: PrivateCookieJar,
) -> Json<MeResponse> {
    let session = resolve_session(
        state.sessions.as_ref(),
        &jar,
        &state.settings.session_cookie_name,
    )
    .await;

    Json(match session {
        Some(session) => MeResponse {
            authenticated: true,
            email: session.claims.get("email").cloned(),
            name: session.claims.get("name").cloned(),
            expires_at: Some(session.expires_at.unix_timestamp()),
            sub: Some(session.subject.0),
        },
        None => MeResponse {
            authenticated: false,
            sub: None,
            email: None,
            name: None,
            expires_at: None,
        },
    })
}

// ── Helpers ────────────────────────────────────────────────────────

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_params_are_lenient() {
        let params = CallbackParams::parse(Some("code=abc&state=xyz&junk&%ZZ=1&state=second"));
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());

        let params = CallbackParams::parse(None);
        assert!(params.code.is_none() && params.state.is_none());
    }

    #[test]
    fn empty_values_count_as_absent() {
        let params = CallbackParams::parse(Some("code=&state="));
        assert!(params.code.is_none());
        assert!(params.state.is_none());
    }

    #[test]
    fn query_param_decodes() {
        assert_eq!(
            query_param(Some("returnTo=%2Fmesh%3Fa%3D1"), "returnTo").as_deref(),
            Some("/mesh?a=1")
        );
        assert_eq!(query_param(Some("other=1"), "returnTo"), None);
        assert_eq!(query_param(None, "returnTo"), None);
    }
}
