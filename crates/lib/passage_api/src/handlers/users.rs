//! Handlers behind the authorization gate.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{MeResponse, UserListResponse};

/// `GET /me`: the identity carried by the presented token.
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.0.user_id,
        role: user.0.role,
    })
}

/// `GET /users`: list all users. Admin only.
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> AppResult<Json<UserListResponse>> {
    let users = state.store.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(Into::into).collect(),
    }))
}
