use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use url::Url;

/// Claims asserted by the identity provider for an authenticated user.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// IdP subject identifier (the OIDC `sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct Subject(pub String);

const MAX_RETURN_TO_LEN: usize = 2048;

/// Reference origin used to resolve candidate `returnTo` values.
const PROBE_ORIGIN: &str = "http://frontdoor.invalid/";

/// A post-login destination that is guaranteed to stay on this origin.
///
/// Only relative paths are accepted: anything carrying a scheme, an authority
/// (`//host`), backslashes or control characters is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct ReturnTo(String);

/// Raised when a `returnTo` candidate would leave this origin.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("returnTo rejected: {0}")]
pub struct OpenRedirectRejected(pub &'static str);

impl ReturnTo {
    /// Validate a caller-supplied `returnTo` value.
    ///
    /// # Errors
    ///
    /// Returns [`OpenRedirectRejected`] if the value is not a same-origin relative path.
    pub fn parse(raw: &str) -> Result<Self, OpenRedirectRejected> {
        if raw.is_empty() || raw.len() > MAX_RETURN_TO_LEN {
            return Err(OpenRedirectRejected("empty or oversized"));
        }
        if !raw.starts_with('/') || raw.starts_with("//") {
            return Err(OpenRedirectRejected("not a relative path"));
        }
        if raw.contains('\\') || raw.chars().any(char::is_control) {
            return Err(OpenRedirectRejected("illegal characters"));
        }

        let base = Url::parse(PROBE_ORIGIN).map_err(|_| OpenRedirectRejected("probe origin"))?;
        let resolved = base
            .join(raw)
            .map_err(|_| OpenRedirectRejected("unparseable"))?;
        if resolved.origin() != base.origin() {
            return Err(OpenRedirectRejected("cross-origin"));
        }

        let mut normalized = resolved.path().to_string();
        if let Some(query) = resolved.query() {
            normalized.push('?');
            normalized.push_str(query);
        }
        Ok(Self(normalized))
    }

    /// The site root, used when no valid destination was supplied.
    #[must_use]
    pub fn root() -> Self {
        Self("/".into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReturnTo {
    fn default() -> Self {
        Self::root()
    }
}
