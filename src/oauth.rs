use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::Error;
use crate::pkce;
use crate::types::{Claims, Subject};

/// `OAuth2`/OIDC client configuration for the upstream identity provider.
///
/// Endpoints default to the Auth0 layout under the issuer base URL
/// (`/authorize`, `/oauth/token`, `/userinfo`) and can be overridden.
///
/// ```rust,ignore
/// let issuer: Url = "https://tenant.eu.auth0.com/".parse()?;
/// let config = OAuthConfig::new("my-client-id", "https://my-app.com/auth/callback".parse()?, &issuer)?
///     .with_client_secret("s3cr3t".to_string().into());
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<SecretString>,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) audience: Option<String>,
}

impl OAuthConfig {
    /// Create a configuration rooted at the provider's issuer URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if endpoint URLs cannot be derived from `issuer`.
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: Url,
        issuer: &Url,
    ) -> Result<Self, Error> {
        let mut base = issuer.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = |path: &str| {
            base.join(path)
                .map_err(|e| Error::Config(format!("issuer endpoint {path}: {e}")))
        };

        Ok(Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_url: endpoint("authorize")?,
            token_url: endpoint("oauth/token")?,
            userinfo_url: endpoint("userinfo")?,
            redirect_uri,
            scopes: vec!["openid".into(), "profile".into(), "email".into()],
            audience: None,
        })
    }

    /// Confidential-client secret sent on the token exchange.
    #[must_use]
    pub fn with_client_secret(mut self, secret: SecretString) -> Self {
        self.client_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the requested scopes (default: `["openid", "profile", "email"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// `OAuth2` authorization-code client with PKCE.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

/// Outbound authorization request plus the secrets to remember until the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
}

/// Token response from the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Identity established by a successful code exchange.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: Subject,
    pub claims: Claims,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (timeouts, connection pool reuse, testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorize URL with fresh `state`, `nonce` and PKCE parameters.
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let state = pkce::generate_state();
        let nonce = pkce::generate_nonce();
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("scope", &scope)
                .append_pair("state", &state)
                .append_pair("nonce", &nonce)
                .append_pair("code_challenge", &code_challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(audience) = &self.config.audience {
                query.append_pair("audience", audience);
            }
        }

        AuthorizationRequest {
            url: url.into(),
            state,
            nonce,
            code_verifier,
        }
    }

    /// Exchange an authorization code for tokens using PKCE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint rejects the grant.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.expose_secret()));
        }

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token exchange").await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Fetch the userinfo claims for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the userinfo endpoint returns an error.
    pub async fn get_user_info(&self, access_token: &str) -> Result<Claims, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        response.json::<Claims>().await.map_err(Into::into)
    }

    /// Run the full exchange: redeem `code`, then derive the user's identity.
    ///
    /// Claims come from the ID token when the provider returns one (its `nonce`
    /// and `aud` must match), otherwise from the userinfo endpoint.
    ///
    /// # Errors
    ///
    /// Any failure of the exchange, the ID token checks, or a missing `sub`.
    pub async fn redeem(
        &self,
        code: &str,
        code_verifier: &str,
        nonce: &str,
    ) -> Result<Identity, Error> {
        let tokens = self.exchange_code(code, code_verifier).await?;

        let mut claims = match tokens.id_token.as_deref() {
            Some(id_token) => {
                let claims = decode_id_token(id_token)?;
                check_id_token(&claims, nonce, &self.config.client_id)?;
                claims
            }
            None => self.get_user_info(&tokens.access_token).await?,
        };
        claims.remove("nonce");

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|sub| !sub.is_empty())
            .map(|sub| Subject(sub.to_owned()))
            .ok_or(Error::MissingSubject)?;

        Ok(Identity { subject, claims })
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::OAuth {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}

/// Decode the payload segment of a compact JWS.
///
/// The token was received directly from the token endpoint over TLS, so the
/// transport authenticates the issuer (OIDC Core 3.1.3.7).
pub(crate) fn decode_id_token(id_token: &str) -> Result<Claims, Error> {
    let mut segments = id_token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(Error::InvalidIdToken("expected three segments".into())),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::InvalidIdToken(format!("payload encoding: {e}")))?;
    serde_json::from_slice::<Claims>(&bytes)
        .map_err(|e| Error::InvalidIdToken(format!("payload json: {e}")))
}

fn check_id_token(claims: &Claims, nonce: &str, client_id: &str) -> Result<(), Error> {
    if claims.get("nonce").and_then(Value::as_str) != Some(nonce) {
        return Err(Error::InvalidIdToken("nonce mismatch".into()));
    }
    let audience_ok = match claims.get("aud") {
        Some(Value::String(aud)) => aud == client_id,
        Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(client_id)),
        _ => false,
    };
    if !audience_ok {
        return Err(Error::InvalidIdToken("audience mismatch".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> OAuthConfig {
        OAuthConfig::new(
            "test-client",
            "https://example.com/auth/callback".parse().unwrap(),
            &"https://tenant.example.com".parse().unwrap(),
        )
        .unwrap()
    }

    fn fake_id_token(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.c2ln")
    }

    #[test]
    fn test_endpoints_derived_from_issuer() {
        let config = test_config();
        assert_eq!(config.auth_url().as_str(), "https://tenant.example.com/authorize");
        assert_eq!(config.token_url().as_str(), "https://tenant.example.com/oauth/token");
        assert_eq!(config.userinfo_url().as_str(), "https://tenant.example.com/userinfo");
    }

    #[test]
    fn test_endpoints_keep_issuer_path() {
        let config = OAuthConfig::new(
            "c",
            "https://example.com/auth/callback".parse().unwrap(),
            &"https://idp.example.com/tenants/acme".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(
            config.auth_url().as_str(),
            "https://idp.example.com/tenants/acme/authorize"
        );
    }

    #[test]
    fn test_authorization_url_contains_pkce_and_nonce() {
        let client = AuthClient::new(test_config());
        let req = client.authorization_url();

        assert!(req.url.starts_with("https://tenant.example.com/authorize?"));
        assert!(req.url.contains("response_type=code"));
        assert!(req.url.contains("client_id=test-client"));
        assert!(req.url.contains("code_challenge_method=S256"));
        assert!(req.url.contains(&format!("state={}", req.state)));
        assert!(req.url.contains(&format!("nonce={}", req.nonce)));
        assert!(req.url.contains(&format!(
            "code_challenge={}",
            pkce::generate_code_challenge(&req.code_verifier)
        )));
        assert!(req.url.contains("scope=openid+profile+email"));
    }

    #[test]
    fn test_authorization_url_unique_per_call() {
        let client = AuthClient::new(test_config());
        let req1 = client.authorization_url();
        let req2 = client.authorization_url();

        assert_ne!(req1.state, req2.state);
        assert_ne!(req1.nonce, req2.nonce);
        assert_ne!(req1.code_verifier, req2.code_verifier);
    }

    #[test]
    fn test_audience_is_forwarded() {
        let client = AuthClient::new(test_config().with_audience("https://api.example.com"));
        let req = client.authorization_url();
        assert!(req.url.contains("audience=https%3A%2F%2Fapi.example.com"));
    }

    #[test]
    fn test_decode_id_token() {
        let token = fake_id_token(&json!({"sub": "auth0|42", "nonce": "n"}));
        let claims = decode_id_token(&token).unwrap();
        assert_eq!(claims["sub"], "auth0|42");
    }

    #[test]
    fn test_decode_id_token_rejects_garbage() {
        assert!(decode_id_token("not-a-jwt").is_err());
        assert!(decode_id_token("a.b.c.d").is_err());
        assert!(decode_id_token("a.!!!.c").is_err());
    }

    #[test]
    fn test_check_id_token_nonce_and_audience() {
        let ok = json!({"nonce": "n1", "aud": "test-client"});
        let ok = ok.as_object().unwrap();
        assert!(check_id_token(ok, "n1", "test-client").is_ok());
        assert!(check_id_token(ok, "n2", "test-client").is_err());
        assert!(check_id_token(ok, "n1", "other-client").is_err());

        let multi = json!({"nonce": "n1", "aud": ["api", "test-client"]});
        assert!(check_id_token(multi.as_object().unwrap(), "n1", "test-client").is_ok());

        let missing = json!({"aud": "test-client"});
        assert!(check_id_token(missing.as_object().unwrap(), "n1", "test-client").is_err());
    }
}
