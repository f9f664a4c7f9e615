use axum::extract::{Request, State};
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use super::classify::{RouteClass, Surface};
use super::error::AuthError;
use super::extractor::{CurrentSession, resolve_session};
use super::flow::LOGIN_PATH;
use super::state::AuthState;
use super::traits::{PendingRequestStore, SessionStore};

/// Access guard. Runs before every handler, including the 404 fallback.
///
/// Classification is static per path: the decision never depends on
/// `Accept` or other request headers.
pub(super) async fn access_guard<P, S>(
    State(state): State<AuthState<P, S>>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    P: PendingRequestStore,
    S: SessionStore,
{
    let path = request.uri().path().to_owned();

    match state.routes.classify(&path) {
        RouteClass::Public => next.run(request).await,
        RouteClass::LegacyRedirect(target) => {
            let location = match request.uri().query() {
                Some(query) => format!("{target}?{query}"),
                None => target.to_string(),
            };
            tracing::debug!(from = %path, to = %target, "Legacy auth path redirected");
            Redirect::temporary(&location).into_response()
        }
        RouteClass::LegacyGone(message) => {
            tracing::info!(path = %path, method = %request.method(), "Retired endpoint called");
            AuthError::Gone(message.to_string()).into_response()
        }
        RouteClass::Protected(surface) => {
            let session = resolve_session(
                state.sessions.as_ref(),
                &jar,
                &state.settings.session_cookie_name,
            )
            .await;

            match (session, surface) {
                (Some(session), _) => {
                    request.extensions_mut().insert(CurrentSession(session));
                    next.run(request).await
                }
                (None, Surface::Api) => AuthError::Unauthorized.into_response(),
                (None, Surface::Page) => {
                    Redirect::temporary(&login_location(request.uri())).into_response()
                }
            }
        }
    }
}

/// `/auth/login?returnTo=<percent-encoded path and query>`.
pub(super) fn login_location(uri: &Uri) -> String {
    let original = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("{LOGIN_PATH}?returnTo={}", urlencoding::encode(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_location_encodes_path_and_query() {
        let uri: Uri = "/dashboard".parse().unwrap();
        assert_eq!(login_location(&uri), "/auth/login?returnTo=%2Fdashboard");

        let uri: Uri = "/mesh/devices?tab=all&page=2".parse().unwrap();
        assert_eq!(
            login_location(&uri),
            "/auth/login?returnTo=%2Fmesh%2Fdevices%3Ftab%3Dall%26page%3D2"
        );
    }
}
