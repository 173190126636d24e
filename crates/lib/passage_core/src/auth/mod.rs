//! Authentication and authorization logic.
//!
//! Provides password hashing, session tokens, the user store, identity
//! resolution and the delegated-login flow shared by `passage_api` and
//! `passage_server`.

pub mod jwt;
pub mod login_flow;
pub mod password;
pub mod provider;
pub mod queries;
pub mod resolver;
pub mod store;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Generate a random alphanumeric string of `len` characters.
pub(crate) fn random_alphanumeric(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
