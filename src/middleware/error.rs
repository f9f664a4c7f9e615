use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use super::flow::ErrorReason;

/// Failures detected at the front door. Each variant renders to exactly one
/// response shape; none escapes as a raw fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Required IdP configuration is missing. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Callback `state` unknown, already consumed, or expired.
    #[error("Invalid or expired state")]
    InvalidState,

    /// The IdP refused the grant or could not be reached.
    #[error("Code exchange failed: {0}")]
    CodeExchange(String),

    /// The IdP redirected back with an `error` parameter.
    #[error("Identity provider error: {0}")]
    ProviderRejected(String),

    /// No valid session on an API-style protected route.
    #[error("Unauthorized")]
    Unauthorized,

    /// Retired endpoint.
    #[error("Gone: {0}")]
    Gone(String),

    /// Session or pending-request store failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Reason code shown on the error surface for callback failures.
    #[must_use]
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidState => ErrorReason::InvalidState,
            Self::CodeExchange(_) => ErrorReason::CallbackError,
            Self::ProviderRejected(error) if error == "access_denied" => ErrorReason::AccessDenied,
            Self::ProviderRejected(_) => ErrorReason::CallbackError,
            Self::Unauthorized => ErrorReason::Unauthorized,
            Self::Configuration(_) | Self::Gone(_) | Self::Store(_) => ErrorReason::Unknown,
        }
    }

    /// Render as a redirect to the error surface, whatever the variant.
    ///
    /// Used by the callback, which must terminate in the error surface.
    #[must_use]
    pub fn into_error_surface_redirect(self) -> Response {
        Redirect::temporary(&self.reason().location()).into_response()
    }
}

#[derive(Serialize)]
struct UnauthorizedBody {
    success: bool,
    error: &'static str,
}

#[derive(Serialize)]
struct GoneBody<'a> {
    error: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct InternalBody {
    success: bool,
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Configuration(ref detail) => {
                tracing::error!(detail = %detail, "Authentication is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(InternalBody {
                        success: false,
                        error: "ConfigurationError",
                    }),
                )
                    .into_response()
            }
            Self::InvalidState | Self::CodeExchange(_) | Self::ProviderRejected(_) => {
                self.into_error_surface_redirect()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(UnauthorizedBody {
                    success: false,
                    error: "Unauthorized",
                }),
            )
                .into_response(),
            Self::Gone(ref message) => (
                StatusCode::GONE,
                Json(GoneBody {
                    error: "Gone",
                    message,
                }),
            )
                .into_response(),
            Self::Store(ref detail) => {
                tracing::error!(detail = %detail, "Auth store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(InternalBody {
                        success: false,
                        error: "Internal error",
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_shape() {
        let response = AuthError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(LOCATION).is_none());
        let body = json_body(response).await;
        assert_eq!(body, serde_json::json!({"success": false, "error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn gone_shape() {
        let response = AuthError::Gone("This endpoint has been deprecated.".into()).into_response();
        assert_eq!(response.status(), StatusCode::GONE);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Gone");
        assert_eq!(body["message"], "This endpoint has been deprecated.");
    }

    #[tokio::test]
    async fn configuration_is_500_without_redirect() {
        let response = AuthError::Configuration("AUTH0_DOMAIN".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[test]
    fn callback_failures_redirect_to_error_surface() {
        let cases = [
            (AuthError::InvalidState, "/auth-error?e=invalid_state"),
            (AuthError::CodeExchange("boom".into()), "/auth-error?e=callback_error"),
            (
                AuthError::ProviderRejected("access_denied".into()),
                "/auth-error?e=access_denied",
            ),
            (
                AuthError::ProviderRejected("server_error".into()),
                "/auth-error?e=callback_error",
            ),
        ];
        for (error, expected) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(response.headers()[LOCATION], expected);
        }
    }

    #[test]
    fn store_errors_on_callback_still_land_on_error_surface() {
        let response = AuthError::Store("db down".into()).into_error_surface_redirect();
        assert_eq!(response.headers()[LOCATION], "/auth-error?e=unknown");
    }
}
