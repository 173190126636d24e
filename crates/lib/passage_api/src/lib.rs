//! # passage_api
//!
//! HTTP API library for Passage.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use passage_core::auth::AuthError;
use passage_core::auth::jwt::TokenIssuer;
use passage_core::auth::provider::IdentityProvider;
use passage_core::auth::store::UserStore;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, home, oauth, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Identity records.
    pub store: Arc<dyn UserStore>,
    /// Identity provider for delegated login.
    pub provider: Arc<dyn IdentityProvider>,
    /// Session token issuer, keyed with the process-wide secret.
    pub tokens: Arc<TokenIssuer>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Build state from configuration and collaborators. Fails if the signing
    /// secret is unusable.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn UserStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenIssuer::new(config.jwt_secret.as_bytes())?);
        Ok(Self {
            store,
            provider,
            tokens,
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `passage_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    passage_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HOME, get(home::home_handler))
        .route(routes::POST_SIGNUP, post(auth::signup_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::GET_GOOGLE_LOGIN, get(oauth::google_login_handler))
        .route(
            routes::GOOGLE_CALLBACK,
            get(oauth::google_callback_handler).post(oauth::google_callback_form_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_ME, get(users::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes (require auth + admin role)
    let admin = Router::new()
        .route(routes::GET_USERS, get(users::list_users_handler))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
