//! Maps a verified external profile to a local user, creating one on first
//! sight.

use chrono::Utc;
use tracing::{info, warn};

use super::password::hash_password_blocking;
use super::store::UserStore;
use super::{AuthError, random_alphanumeric};
use crate::models::auth::{Role, User};
use crate::uuid::uuidv7;

/// Length of the throwaway password hashed for provider-only accounts.
const PROVIDER_PASSWORD_LEN: usize = 64;

/// Outcome of resolving an email to a local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A user with this email already existed and is returned unchanged.
    Existing(User),
    /// No user existed; this one was created and persisted.
    Created(User),
}

impl Resolution {
    pub fn user(&self) -> &User {
        match self {
            Resolution::Existing(u) | Resolution::Created(u) => u,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Resolution::Existing(u) | Resolution::Created(u) => u,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Resolve `email` to a local user.
///
/// Existing records are never overwritten with provider data. New records
/// get role `user` and a password hash over a random value nobody knows, so
/// they can only sign in through the provider.
pub async fn resolve_by_email(
    store: &dyn UserStore,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Resolution, AuthError> {
    if email.is_empty() {
        return Err(AuthError::Validation("profile has no email".into()));
    }

    if let Some(user) = store.find_user_by_email(email).await? {
        info!(user_id = %user.id, "existing user resolved via provider");
        return Ok(Resolution::Existing(user));
    }

    let password_hash = hash_password_blocking(random_alphanumeric(PROVIDER_PASSWORD_LEN)).await?;
    let now = Utc::now();
    let user = User {
        id: uuidv7(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password_hash,
        role: Role::User,
        created_at: now,
        updated_at: now,
    };

    match store.insert_user(&user).await {
        Ok(()) => {
            info!(user_id = %user.id, "new user created via provider");
            Ok(Resolution::Created(user))
        }
        Err(AuthError::DuplicateEmail) => {
            // Another request created this email between our lookup and insert.
            warn!("concurrent first login detected, using the winning record");
            store
                .find_user_by_email(email)
                .await?
                .map(Resolution::Existing)
                .ok_or_else(|| {
                    AuthError::Internal("user vanished after duplicate insert".into())
                })
        }
        Err(e) => Err(e),
    }
}
