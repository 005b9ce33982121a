//! User repository
//!
//! Username and email uniqueness come from `users_username_key` and
//! `users_email_key`; callers inspect the conflict constraint to tell them apart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use animelog_core::models::NewUser;

use super::DbError;

pub const USERNAME_CONSTRAINT: &str = "users_username_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Full user row. Never serialized: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user with the ids of their tracked entries
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub anime_list: Vec<Uuid>,
    pub manga_list: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user with an already hashed password.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<UserRecord, DbError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::classify("user", e))
    }

    /// Look up by normalized email. `None` when no such user.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<UserRecord, DbError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Profile with anime and manga id lists, newest entries first.
    pub async fn profile(&self, id: Uuid) -> Result<UserProfile, DbError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT
                u.id,
                u.username,
                u.email,
                ARRAY(
                    SELECT a.id FROM anime a
                    WHERE a.user_id = u.id
                    ORDER BY a.created_at DESC
                ) AS anime_list,
                ARRAY(
                    SELECT m.id FROM manga m
                    WHERE m.user_id = u.id
                    ORDER BY m.created_at DESC
                ) AS manga_list,
                u.created_at,
                u.updated_at
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }
}
