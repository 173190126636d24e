//! API server configuration.

use std::fmt;

use passage_core::auth::provider::ProviderConfig;
use thiserror::Error;

/// Default provider callback for local deployments.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:9000/auth/google/callback";

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:9000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Session token signing secret.
    pub jwt_secret: String,
    /// Identity provider registration and endpoints.
    pub provider: ProviderConfig,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("pg_connection_url", &self.pg_connection_url)
            .field("jwt_secret", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from the process environment. The binary loads
    /// `.env` into the environment before calling this.
    ///
    /// | Variable               | Default                                        |
    /// |------------------------|------------------------------------------------|
    /// | `BIND_ADDR`            | `0.0.0.0:9000`                                 |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/passage`            |
    /// | `JWT_SECRET`           | required                                       |
    /// | `GOOGLE_CLIENT_ID`     | required                                       |
    /// | `GOOGLE_CLIENT_SECRET` | required                                       |
    /// | `GOOGLE_REDIRECT_URL`  | `http://localhost:9000/auth/google/callback`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let jwt_secret = require("JWT_SECRET")?;
        let client_id = require("GOOGLE_CLIENT_ID")?;
        let client_secret = require("GOOGLE_CLIENT_SECRET")?;
        let redirect_url =
            get("GOOGLE_REDIRECT_URL").unwrap_or_else(|| DEFAULT_REDIRECT_URL.into());

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:9000".into()),
            pg_connection_url: get("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/passage".into()),
            jwt_secret,
            provider: ProviderConfig::google(client_id, client_secret, redirect_url),
        })
    }
}
