use std::time::Duration as StdDuration;

use axum_extra::extract::cookie::Key;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use super::classify::RouteTable;
use super::error::AuthError;
use super::flow::CALLBACK_PATH;
use super::introspection::RequiredConfig;
use crate::oauth::{AuthClient, OAuthConfig};
use crate::types::ReturnTo;

/// Minimum length of `AUTH0_SECRET`, the cookie-encryption master secret.
pub const MIN_SECRET_LEN: usize = 32;

const IDP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) pending_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) default_return_to: ReturnTo,
    pub(crate) logout_redirect: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "appSession".into(),
            session_ttl: Duration::hours(24),
            pending_ttl: Duration::minutes(10),
            secure_cookies: true,
            default_return_to: ReturnTo::root(),
            logout_redirect: "/".into(),
        }
    }

    /// Validate a caller-supplied `returnTo`, falling back to the default landing path.
    pub(crate) fn resolve_return_to(&self, raw: Option<&str>) -> ReturnTo {
        match raw.map(ReturnTo::parse) {
            Some(Ok(return_to)) => return_to,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring unsafe returnTo");
                self.default_return_to.clone()
            }
            None => self.default_return_to.clone(),
        }
    }
}

/// What the introspection endpoint reports about the runtime configuration.
#[derive(Debug, Clone)]
pub(crate) struct ConfigStatus {
    pub(crate) environment: String,
    pub(crate) required: RequiredConfig,
    pub(crate) issues: Vec<String>,
}

/// Front door configuration. Built once at startup, then moved into the router.
///
/// A missing IdP key does not prevent startup: the service boots, the
/// introspection endpoint reports the gap, and `/auth/login` answers 500.
///
/// Use [`from_env()`](FrontDoorConfig::from_env) for convention-based setup,
/// or [`new()`](FrontDoorConfig::new) with `with_*` methods for full control.
pub struct FrontDoorConfig {
    pub(super) client: Option<AuthClient>,
    pub(super) settings: AuthSettings,
    pub(super) routes: RouteTable,
    pub(super) status: ConfigStatus,
}

impl FrontDoorConfig {
    /// Create a fully configured front door around an IdP client.
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client: Some(client),
            settings: AuthSettings::defaults(),
            routes: RouteTable::standard(),
            status: ConfigStatus {
                environment: "development".into(),
                required: RequiredConfig::all_present(),
                issues: Vec::new(),
            },
        }
    }

    /// A front door with no IdP: login answers 500 until configured.
    #[must_use]
    pub fn unconfigured() -> Self {
        let required = RequiredConfig::default();
        Self {
            client: None,
            settings: AuthSettings::defaults(),
            routes: RouteTable::standard(),
            status: ConfigStatus {
                environment: "development".into(),
                issues: required.missing().map(|k| format!("{k} is not set")).collect(),
                required,
            },
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars (login is disabled while any is absent)
    /// - `AUTH0_DOMAIN`: IdP tenant host or issuer URL
    /// - `AUTH0_CLIENT_ID`, `AUTH0_CLIENT_SECRET`: OAuth2 client credentials
    /// - `AUTH0_SECRET`: cookie encryption master secret (32+ bytes)
    /// - `APP_BASE_URL`: public base URL; the callback is `<APP_BASE_URL>/auth/callback`
    ///
    /// # Optional env vars
    /// - `AUTH0_AUTHORIZE_URL`, `AUTH0_TOKEN_URL`, `AUTH0_USERINFO_URL`: endpoint overrides
    /// - `AUTH0_SCOPES`: comma-separated scopes
    /// - `AUTH0_AUDIENCE`: API audience
    /// - `APP_ENV`: runtime environment name (default `development`)
    /// - `DEV_AUTH`: `"1"` or `"true"` drops the `Secure` cookie attribute
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = get("APP_ENV").unwrap_or_else(|| "development".into());
        let domain = get("AUTH0_DOMAIN");
        let client_id = get("AUTH0_CLIENT_ID");
        let client_secret = get("AUTH0_CLIENT_SECRET");
        let secret = get("AUTH0_SECRET");
        let base_url = get("APP_BASE_URL");

        let required = RequiredConfig {
            secret: secret.is_some(),
            domain: domain.is_some(),
            client_id: client_id.is_some(),
            client_secret: client_secret.is_some(),
            base_url: base_url.is_some(),
        };
        let mut issues: Vec<String> = required
            .missing()
            .map(|k| format!("{k} is not set"))
            .collect();

        let cookie_key = match secret.as_deref() {
            Some(s) if s.len() >= MIN_SECRET_LEN => Some(Key::derive_from(s.as_bytes())),
            Some(s) => {
                issues.push(format!(
                    "AUTH0_SECRET is too short ({} chars, need {MIN_SECRET_LEN}+)",
                    s.len()
                ));
                None
            }
            None => None,
        };

        let issuer = domain
            .as_deref()
            .map(|d| parse_base_url("AUTH0_DOMAIN", d))
            .transpose()?;
        let base_url = base_url
            .as_deref()
            .map(|b| parse_base_url("APP_BASE_URL", b))
            .transpose()?;
        let auth_url = get("AUTH0_AUTHORIZE_URL")
            .map(|u| parse_url("AUTH0_AUTHORIZE_URL", &u))
            .transpose()?;
        let token_url = get("AUTH0_TOKEN_URL")
            .map(|u| parse_url("AUTH0_TOKEN_URL", &u))
            .transpose()?;
        let userinfo_url = get("AUTH0_USERINFO_URL")
            .map(|u| parse_url("AUTH0_USERINFO_URL", &u))
            .transpose()?;

        if let Some(base) = &base_url {
            if base.host_str() == Some("localhost") && environment == "production" {
                issues.push("APP_BASE_URL points at localhost in production".into());
            }
        }

        let client = match (issuer, client_id, client_secret, &base_url, &cookie_key) {
            (Some(issuer), Some(client_id), Some(client_secret), Some(base), Some(_)) => {
                let redirect_uri = parse_url(
                    "APP_BASE_URL",
                    &format!("{}{CALLBACK_PATH}", base.as_str().trim_end_matches('/')),
                )?;
                let mut config = OAuthConfig::new(client_id, redirect_uri, &issuer)
                    .map_err(|e| AuthError::Configuration(e.to_string()))?
                    .with_client_secret(SecretString::from(client_secret));
                if let Some(url) = auth_url {
                    config = config.with_auth_url(url);
                }
                if let Some(url) = token_url {
                    config = config.with_token_url(url);
                }
                if let Some(url) = userinfo_url {
                    config = config.with_userinfo_url(url);
                }
                if let Some(scopes) = get("AUTH0_SCOPES") {
                    config = config
                        .with_scopes(scopes.split(',').map(|s| s.trim().to_string()).collect());
                }
                if let Some(audience) = get("AUTH0_AUDIENCE") {
                    config = config.with_audience(audience);
                }

                let http = reqwest::Client::builder()
                    .timeout(IDP_TIMEOUT)
                    .build()
                    .map_err(|e| AuthError::Configuration(format!("HTTP client: {e}")))?;
                Some(AuthClient::new(config).with_http_client(http))
            }
            _ => None,
        };

        let dev_auth = matches!(get("DEV_AUTH").as_deref(), Some("1" | "true"));

        let mut settings = AuthSettings::defaults();
        settings.secure_cookies = !dev_auth;
        if let Some(key) = cookie_key {
            settings.cookie_key = key;
        }

        Ok(Self {
            client,
            settings,
            routes: RouteTable::standard(),
            status: ConfigStatus {
                environment,
                required,
                issues,
            },
        })
    }

    /// Whether `/auth/login` can start a flow.
    #[must_use]
    pub fn is_login_configured(&self) -> bool {
        self.client.is_some()
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.settings.pending_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_default_return_to(mut self, return_to: ReturnTo) -> Self {
        self.settings.default_return_to = return_to;
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.status.environment = environment.into();
        self
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, AuthError> {
    value
        .parse()
        .map_err(|e| AuthError::Configuration(format!("{name}: {e}")))
}

/// Accepts a bare host (`tenant.auth0.com`) or a full URL.
fn parse_base_url(name: &str, value: &str) -> Result<Url, AuthError> {
    if value.contains("://") {
        parse_url(name, value)
    } else {
        parse_url(name, &format!("https://{value}"))
    }
}
