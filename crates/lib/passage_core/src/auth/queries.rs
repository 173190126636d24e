//! Auth-related database queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use super::store::UserStore;
use crate::models::auth::{Role, User};

type UserRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password, role, created_at, updated_at";

fn user_from_row(row: UserRow) -> Result<User, AuthError> {
    let (id, first_name, last_name, email, password_hash, role, created_at, updated_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| AuthError::Internal(format!("users.role: {e}")))?;
    Ok(User {
        id,
        first_name,
        last_name,
        email,
        password_hash,
        role,
        created_at,
        updated_at,
    })
}

/// PostgreSQL-backed user store. The `users_email_key` constraint enforces
/// email uniqueness.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), AuthError> {
        let result = sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::DuplicateEmail)
            }
            Err(e) => Err(AuthError::PersistenceFailed(e)),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(user_from_row).collect()
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET role = $1, updated_at = now() WHERE email = $2")
                .bind(role.as_str())
                .bind(email)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
