//! Password hashing via bcrypt.

use tracing::debug;

use super::AuthError;

/// bcrypt cost factor. Fixed; there is no faster setting.
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Longest password bcrypt accepts without truncating. The terminating NUL
/// byte bcrypt appends takes the 72nd byte.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Hash a password with bcrypt. The random salt is embedded in the output.
///
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected, never truncated.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    bcrypt::non_truncating_hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A malformed hash, or a password too long to have been hashed, verifies as
/// `false` rather than failing.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::non_truncating_verify(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            debug!("bcrypt verify rejected stored hash: {e}");
            false
        }
    }
}

/// Hash a password on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
}

/// Verify a password on the blocking thread pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
}
