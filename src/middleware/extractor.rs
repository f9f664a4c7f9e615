use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use time::OffsetDateTime;

use super::error::AuthError;
use super::traits::SessionStore;
use super::types::Session;
use crate::types::SessionId;

/// Authenticated session attached to the request by the access guard.
///
/// Use as an Axum extractor in handlers behind the front door. Returns
/// `401 Unauthorized` if the guard did not attach a session.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     format!("Hello, {}", session.subject)
/// }
///
/// // Optional: on public routes the guard never attaches a session
/// async fn home(session: Option<CurrentSession>) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<St: Send + Sync> FromRequestParts<St> for CurrentSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}

impl<St: Send + Sync> OptionalFromRequestParts<St> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &St,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentSession>().cloned())
    }
}

/// Resolve the session named by the cookie jar, if it is present and live.
///
/// Fails closed: a missing or undecryptable cookie, an unknown id, an expired
/// session and a store error all yield `None`.
pub async fn resolve_session<S: SessionStore>(
    store: &S,
    jar: &PrivateCookieJar,
    cookie_name: &str,
) -> Option<Session> {
    let cookie = jar.get(cookie_name)?;
    let session_id = SessionId(cookie.value().to_string());

    let session = match store.find(&session_id).await {
        Ok(found) => found?,
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed, treating as anonymous");
            return None;
        }
    };

    if session.is_expired_at(OffsetDateTime::now_utc()) {
        tracing::debug!(subject = %session.subject, "Session expired");
        return None;
    }
    Some(session)
}
