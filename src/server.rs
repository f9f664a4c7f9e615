use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    response::Html,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::middleware::{
    CurrentSession, FrontDoorConfig, PendingRequestStore, SessionStore, front_door,
};

const REQUEST_ID: &str = "x-request-id";

/// Application routes served behind the front door.
///
/// Every path here is classified as protected, so handlers can rely on
/// [`CurrentSession`] being present.
#[must_use]
pub fn protected_app() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/api/mesh/open-session", post(open_session))
}

/// Full router: front door, protected app, request ids and tracing.
#[must_use]
pub fn router<P, S>(config: FrontDoorConfig, pending: Arc<P>, sessions: Arc<S>) -> Router
where
    P: PendingRequestStore,
    S: SessionStore,
{
    front_door(config, pending, sessions, protected_app()).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    )
}

/// Bind `[::]:port` and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(app: Router, port: u16) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn dashboard(_session: CurrentSession) -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>Dashboard</title></head>\
         <body><h1>Dashboard</h1><p>Signed in.</p><form method=\"post\" action=\"/auth/logout\">\
         <button type=\"submit\">Sign out</button></form></body></html>\n",
    )
}

async fn open_session(CurrentSession(session): CurrentSession) -> Json<Value> {
    Json(json!({
        "success": true,
        "subject": session.subject,
    }))
}
