//! Identity provider client for the authorization-code grant.
//!
//! `IdentityProvider` is the seam the delegated-login flow talks to;
//! `GoogleProvider` implements it over HTTP with bounded timeouts.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::auth::ExternalProfile;

/// Google authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Google userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested at authorization: email and basic profile.
pub const DEFAULT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Upper bound on any single provider round trip.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response unreadable: {0}")]
    Decode(String),
}

/// Access credential returned by the token endpoint.
#[derive(Clone, Deserialize)]
pub struct AccessCredential {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl AccessCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
        }
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A third-party identity provider speaking the authorization-code grant.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization endpoint URL carrying `state` and the requested scopes.
    fn authorization_url(&self, state: &str) -> String;

    /// Redeem an authorization code for an access credential.
    async fn exchange_code(&self, code: &str) -> Result<AccessCredential, ProviderError>;

    /// Fetch the user's profile with an access credential.
    async fn fetch_profile(
        &self,
        credential: &AccessCredential,
    ) -> Result<ExternalProfile, ProviderError>;
}

/// Provider client registration and endpoints.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Google endpoints and scopes for the given client registration.
    pub fn google(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timeout: PROVIDER_TIMEOUT,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("scopes", &self.scopes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Google OAuth 2.0 client.
pub struct GoogleProvider {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Url::parse(&config.auth_url)
            .map_err(|e| ProviderError::Request(format!("auth url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Request(format!("http client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> String {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("access_type", "online"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        match Url::parse_with_params(&self.config.auth_url, &params) {
            Ok(url) => url.to_string(),
            // Validated in `new`.
            Err(_) => self.config.auth_url.clone(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessCredential, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let resp = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("token exchange: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let credential = resp
            .json::<AccessCredential>()
            .await
            .map_err(|e| ProviderError::Decode(format!("token response: {e}")))?;
        debug!(?credential, "authorization code exchanged");
        Ok(credential)
    }

    async fn fetch_profile(
        &self,
        credential: &AccessCredential,
    ) -> Result<ExternalProfile, ProviderError> {
        let resp = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("userinfo: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        resp.json::<ExternalProfile>()
            .await
            .map_err(|e| ProviderError::Decode(format!("userinfo response: {e}")))
    }
}
