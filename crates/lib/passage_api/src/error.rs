//! Application error types.

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use passage_core::auth::AuthError;
use passage_core::auth::jwt::TokenError;
use passage_core::auth::login_flow::FlowError;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// `Upstream` and `Internal` carry detail for the server log only; clients
/// receive a fixed message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Upstream(detail) => {
                error!(%detail, "upstream failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_error",
                    "Upstream service error",
                )
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

/// Client-facing message for any request that fails to parse.
pub const MALFORMED_REQUEST: &str = "Malformed request";

fn malformed(kind: &str, detail: String) -> AppError {
    debug!(%kind, %detail, "rejected malformed request");
    AppError::Validation(MALFORMED_REQUEST.into())
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        malformed("json", e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        malformed("query", e.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(e: FormRejection) -> Self {
        malformed("form", e.body_text())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Upstream(format!("database: {e}"))
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::DuplicateEmail => AppError::Validation("Email already registered".into()),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::PersistenceFailed(e) => AppError::from(e),
            AuthError::ConfigurationMissing(msg) => {
                AppError::Internal(format!("configuration missing: {msg}"))
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::Unauthorized("Token expired".into()),
            TokenError::InvalidSignature | TokenError::Malformed => {
                AppError::Unauthorized("Invalid token".into())
            }
        }
    }
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::StateMismatch => AppError::Unauthorized("Invalid state".into()),
            FlowError::MissingCode => AppError::Validation("Code not found".into()),
            FlowError::ExchangeFailed(detail) => {
                AppError::Upstream(format!("code exchange: {detail}"))
            }
            FlowError::ProfileFetchFailed(detail) => {
                AppError::Upstream(format!("profile fetch: {detail}"))
            }
            FlowError::ResolveFailed(e) => AppError::Upstream(format!("identity resolution: {e}")),
        }
    }
}
