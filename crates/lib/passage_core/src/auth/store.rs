//! User persistence boundary.
//!
//! `UserStore` is the narrow interface the core needs from the credential
//! store. Email uniqueness is enforced by the implementation, never by a
//! caller-side check-then-insert.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::AuthError;
use crate::models::auth::{Role, User};

/// Storage for identity records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by exact email. `Ok(None)` means not found; any other
    /// failure is an error.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Persist a new user. Returns `AuthError::DuplicateEmail` when the
    /// email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), AuthError>;

    /// All users in creation order.
    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    /// Change the role of the user with `email`. Returns `false` if no such
    /// user exists.
    async fn set_role(&self, email: &str, role: Role) -> Result<bool, AuthError>;
}

/// In-memory user store keyed by email.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(email).map(|u| u.clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AuthError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool, AuthError> {
        match self.users.get_mut(email) {
            Some(mut user) => {
                user.role = role;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
