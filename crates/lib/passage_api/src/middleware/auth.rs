//! Authorization gate: Bearer token extraction, verification and role
//! checks.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use passage_core::models::auth::{Role, Session};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Key used to store the verified `Session` in request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Session);

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies it,
/// and injects `AuthenticatedUser` into request extensions. Any failure is a
/// 401 and the wrapped handler never runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let session = state.tokens.verify(token).map_err(|e| {
        debug!("rejected bearer token: {e}");
        AppError::from(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser(session));

    Ok(next.run(request).await)
}

/// Axum middleware: requires the `admin` role. Must run after
/// [`require_auth`]; a request without a verified session is a 401, a
/// verified non-admin is a 403.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    if user.0.role != Role::Admin {
        debug!(user_id = %user.0.user_id, "admin route refused");
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    Ok(next.run(request).await)
}
