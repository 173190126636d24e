//! Delegated login (Google) handlers.

use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use passage_core::auth::login_flow::{CallbackParams, DelegatedLogin};
use serde::Deserialize;
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::SessionResponse;
use crate::services::cookies::{STATE_COOKIE, clear_state_cookie, state_cookie};

/// Parameters the provider sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}

/// `GET /auth/google/login`: set the state cookie and redirect (307) to the
/// provider's consent screen.
pub async fn google_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let flow = DelegatedLogin::new(state.provider.as_ref(), state.store.as_ref(), &state.tokens);
    let initiation = flow.initiate();
    debug!("delegated login initiated");
    (
        jar.add(state_cookie(&initiation.state)),
        Redirect::temporary(&initiation.redirect_url),
    )
}

/// `GET /auth/google/callback`: provider redirect with query parameters.
pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> (CookieJar, AppResult<Json<SessionResponse>>) {
    let query = query.map(|Query(q)| q).map_err(AppError::from);
    handle_callback(state, jar, query).await
}

/// `POST /auth/google/callback`: provider `form_post` response mode.
pub async fn google_callback_form_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<CallbackQuery>, FormRejection>,
) -> (CookieJar, AppResult<Json<SessionResponse>>) {
    let form = form.map(|Form(f)| f).map_err(AppError::from);
    handle_callback(state, jar, form).await
}

/// The state cookie is cleared on every outcome; it is single use.
async fn handle_callback(
    state: AppState,
    jar: CookieJar,
    query: AppResult<CallbackQuery>,
) -> (CookieJar, AppResult<Json<SessionResponse>>) {
    let cookie_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(clear_state_cookie());

    let query = match query {
        Ok(q) => q,
        Err(e) => return (jar, Err(e)),
    };

    if let Some(reason) = &query.error {
        info!(%reason, "provider reported an authorization error");
    }

    let flow = DelegatedLogin::new(state.provider.as_ref(), state.store.as_ref(), &state.tokens);
    let params = CallbackParams {
        received_state: query.state.as_deref(),
        cookie_state: cookie_state.as_deref(),
        code: query.code.as_deref(),
    };

    let result = flow
        .complete(&params)
        .await
        .map(|session| {
            Json(SessionResponse {
                message: "Login successful via Google".into(),
                token: session.token,
            })
        })
        .map_err(AppError::from);

    (jar, result)
}
