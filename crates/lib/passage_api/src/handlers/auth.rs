//! Password signup and login handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{LoginRequest, SessionResponse, SignupRequest, SignupResponse};
use crate::services::auth;

/// `POST /signup`: create a new local account.
pub async fn signup_handler(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let Json(body) = body?;
    let user = auth::signup(state.store.as_ref(), body).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".into(),
            user: user.into(),
        }),
    ))
}

/// `POST /login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<SessionResponse>> {
    let Json(body) = body?;
    let resp = auth::login(state.store.as_ref(), &state.tokens, body).await?;
    Ok(Json(resp))
}
