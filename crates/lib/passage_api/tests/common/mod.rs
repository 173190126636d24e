//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use passage_api::AppState;
use passage_api::config::ApiConfig;
use passage_core::auth::provider::{AccessCredential, IdentityProvider, ProviderError};
use passage_core::auth::store::MemoryUserStore;
use passage_core::models::auth::ExternalProfile;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Configuration with test credentials and default endpoints.
pub fn test_config() -> ApiConfig {
    ApiConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.into()),
        "GOOGLE_CLIENT_ID" => Some("test-client".into()),
        "GOOGLE_CLIENT_SECRET" => Some("test-client-secret".into()),
        _ => None,
    })
    .expect("test config")
}

/// Identity provider double: each known code yields one profile.
#[derive(Default)]
pub struct FakeProvider {
    profiles: HashMap<String, ExternalProfile>,
}

impl FakeProvider {
    pub fn with_profile(mut self, code: &str, email: &str, given: &str, family: &str) -> Self {
        self.profiles.insert(
            code.to_string(),
            ExternalProfile {
                email: email.into(),
                given_name: given.into(),
                family_name: family.into(),
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://provider.test/authorize?scope=email+profile&state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessCredential, ProviderError> {
        if self.profiles.contains_key(code) {
            Ok(AccessCredential::new(format!("access-{code}")))
        } else {
            Err(ProviderError::Status {
                status: 400,
                body: "invalid_grant".into(),
            })
        }
    }

    async fn fetch_profile(
        &self,
        credential: &AccessCredential,
    ) -> Result<ExternalProfile, ProviderError> {
        let code = credential
            .access_token
            .strip_prefix("access-")
            .unwrap_or_default();
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| ProviderError::Request("unknown access token".into()))
    }
}

/// Router plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryUserStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new(provider: impl IdentityProvider + 'static) -> Self {
        Self::with_config(test_config(), provider)
    }

    pub fn with_config(config: ApiConfig, provider: impl IdentityProvider + 'static) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let state =
            AppState::new(config, store.clone(), Arc::new(provider)).expect("app state");
        Self {
            router: passage_api::router(state.clone()),
            store,
            state,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("request")
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = bearer {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    /// Sign up and log in, returning the session token.
    pub async fn signup_and_login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post_json(
                "/signup",
                serde_json::json!({
                    "firstName": "Test",
                    "lastName": "User",
                    "email": email,
                    "password": password,
                }),
            )
            .await;
        assert_eq!(resp.status(), 201, "signup failed");
        let resp = self
            .post_json(
                "/login",
                serde_json::json!({"email": email, "password": password}),
            )
            .await;
        assert_eq!(resp.status(), 200, "login failed");
        json_body(resp).await["token"]
            .as_str()
            .expect("token")
            .to_string()
    }
}

pub async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

/// Value of the `oauthState` cookie set by a response, if any.
pub fn state_cookie_value(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("oauthState="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

/// Whether a response carries a `Set-Cookie` clearing `oauthState`.
pub fn clears_state_cookie(resp: &Response<Body>) -> bool {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("oauthState=;") && v.contains("Max-Age=0"))
}
