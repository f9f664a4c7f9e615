use std::collections::HashMap;

use super::flow::{AUTH_ERROR_PATH, LOGIN_PATH};

/// How a protected route reports a missing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Browser navigation: redirect to login.
    Page,
    /// Programmatic call: 401 JSON, never a redirect.
    Api,
}

/// Result of classifying a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass<'a> {
    Public,
    Protected(Surface),
    /// Moved endpoint; answer 307 to the new path.
    LegacyRedirect(&'a str),
    /// Retired endpoint; answer 410 with this message.
    LegacyGone(&'a str),
}

#[derive(Debug, Clone)]
enum Disposition {
    Redirect(String),
    Gone(String),
}

#[derive(Debug, Clone)]
enum Pattern {
    Exact(String),
    /// Matches the prefix itself and anything below it (`/a` matches `/a/b`, not `/ab`).
    Prefix(String),
}

impl Pattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => {
                path == p || path.strip_prefix(p.as_str()).is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Public,
    Protected(Surface),
}

/// Static path → classification mapping, built once at startup.
///
/// Lookup order: legacy table (exact paths), then rules in insertion order,
/// then static assets, then the fail-closed default (protected; API-style
/// under `/api/`, page-style elsewhere).
#[derive(Debug, Clone)]
pub struct RouteTable {
    legacy: HashMap<String, Disposition>,
    rules: Vec<(Pattern, Access)>,
    asset_patterns: Vec<Pattern>,
    asset_extensions: Vec<&'static str>,
}

const STATIC_PREFIXES: &[&str] = &["/_next"];
const STATIC_FILES: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];
const STATIC_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".css", ".js", ".map", ".woff",
    ".woff2", ".ttf", ".eot",
];

const PASSWORD_LOGIN_GONE: &str = "Local email/password authentication has been deprecated. \
     Please sign in through the identity provider at /auth/login.";

impl RouteTable {
    /// A table with no rules: every non-asset path is protected.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            legacy: HashMap::new(),
            rules: Vec::new(),
            asset_patterns: STATIC_PREFIXES
                .iter()
                .map(|p| Pattern::Prefix((*p).to_string()))
                .chain(STATIC_FILES.iter().map(|p| Pattern::Exact((*p).to_string())))
                .collect(),
            asset_extensions: STATIC_EXTENSIONS.to_vec(),
        }
    }

    /// The default table for the front door's own endpoints and the known app areas.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .legacy_redirect("/api/auth/login", LOGIN_PATH)
            .legacy_redirect("/api/auth/logout", "/auth/logout")
            .legacy_redirect("/api/auth/callback", "/auth/callback")
            .legacy_redirect("/api/auth/me", "/auth/me")
            .legacy_gone("/api/login", PASSWORD_LOGIN_GONE)
            .public_exact("/")
            .public_exact(AUTH_ERROR_PATH)
            .public_prefix("/auth")
            .public_exact("/api/auth0/me")
            .public_exact("/api/auth0/test-config")
            .protected_page("/dashboard")
            .protected_page("/mesh")
            .protected_page("/admin")
            .protected_page("/provisioning")
            .protected_api("/api/mesh")
            .protected_api("/api/admin")
    }

    #[must_use]
    pub fn public_exact(mut self, path: impl Into<String>) -> Self {
        self.rules.push((Pattern::Exact(path.into()), Access::Public));
        self
    }

    #[must_use]
    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push((Pattern::Prefix(prefix.into()), Access::Public));
        self
    }

    #[must_use]
    pub fn protected_page(mut self, prefix: impl Into<String>) -> Self {
        self.rules
            .push((Pattern::Prefix(prefix.into()), Access::Protected(Surface::Page)));
        self
    }

    #[must_use]
    pub fn protected_api(mut self, prefix: impl Into<String>) -> Self {
        self.rules
            .push((Pattern::Prefix(prefix.into()), Access::Protected(Surface::Api)));
        self
    }

    #[must_use]
    pub fn legacy_redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.legacy
            .insert(from.into(), Disposition::Redirect(to.into()));
        self
    }

    #[must_use]
    pub fn legacy_gone(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.legacy
            .insert(path.into(), Disposition::Gone(message.into()));
        self
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass<'_> {
        match self.legacy.get(path) {
            Some(Disposition::Redirect(to)) => return RouteClass::LegacyRedirect(to.as_str()),
            Some(Disposition::Gone(message)) => return RouteClass::LegacyGone(message.as_str()),
            None => {}
        }

        if let Some((_, access)) = self.rules.iter().find(|(p, _)| p.matches(path)) {
            return match access {
                Access::Public => RouteClass::Public,
                Access::Protected(surface) => RouteClass::Protected(*surface),
            };
        }

        if self.is_static_asset(path) {
            return RouteClass::Public;
        }

        if path == "/api" || path.starts_with("/api/") {
            RouteClass::Protected(Surface::Api)
        } else {
            RouteClass::Protected(Surface::Page)
        }
    }

    fn is_static_asset(&self, path: &str) -> bool {
        self.asset_patterns.iter().any(|p| p.matches(path))
            || self.asset_extensions.iter().any(|ext| path.ends_with(*ext))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
