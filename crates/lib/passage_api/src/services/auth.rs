//! Authentication service: signup/login flows delegating to
//! `passage_core::auth`.

use chrono::Utc;
use passage_core::auth::AuthError;
use passage_core::auth::jwt::TokenIssuer;
use passage_core::auth::password::{
    MAX_PASSWORD_BYTES, hash_password_blocking, verify_password_blocking,
};
use passage_core::auth::store::UserStore;
use passage_core::models::auth::{Role, User};
use passage_core::uuid::uuidv7;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, SessionResponse, SignupRequest};

/// Canonical form of a submitted email.
fn normalize_email(email: &str) -> &str {
    email.trim()
}

/// Register a new local account with role `user`.
pub async fn signup(store: &dyn UserStore, body: SignupRequest) -> AppResult<User> {
    let email = normalize_email(&body.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if body.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }
    if body.password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let now = Utc::now();
    let user = User {
        id: uuidv7(),
        first_name: body.first_name,
        last_name: body.last_name,
        email: email.to_string(),
        password_hash,
        role: Role::User,
        created_at: now,
        updated_at: now,
    };

    store.insert_user(&user).await?;
    info!(user_id = %user.id, "user signed up");
    Ok(user)
}

/// Authenticate with email + password and issue a session token.
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    store: &dyn UserStore,
    tokens: &TokenIssuer,
    body: LoginRequest,
) -> AppResult<SessionResponse> {
    let user = store
        .find_user_by_email(normalize_email(&body.email))
        .await?
        .ok_or(AuthError::CredentialError)?;

    if !verify_password_blocking(body.password, user.password_hash.clone()).await? {
        return Err(AuthError::CredentialError.into());
    }

    let token = tokens.issue(user.id, user.role)?;
    info!(user_id = %user.id, "password login succeeded");
    Ok(SessionResponse {
        message: "Login successful".into(),
        token,
    })
}
