//! # User Repository
//!
//! Accounts. The password hash is only read through [`UserCredentials`],
//! which never leaves this crate's auth provider.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::{DbError, DbResult};
use filamento_core::UserProfile;

/// Role given to accounts created through sign-up.
pub const DEFAULT_ROLE: &str = "admin";

const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, is_active, last_login, created_at, updated_at";

/// What sign-in needs to check a password.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// A new account, hash already computed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        UserRepository { pool, feed }
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, user: &NewUser, now: DateTime<Utc>) -> DbResult<UserProfile> {
        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, full_name, role, is_active, last_login,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, NULL, ?6, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, user.email.clone()),
            other => other,
        })?;

        self.feed.publish(Table::Users, ChangeKind::Inserted, &user.id);

        self.get_profile(&user.id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &user.id))
    }

    /// Looks up credentials by email, case-insensitively.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password_hash, is_active FROM users WHERE email = ?1",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    pub async fn get_profile(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1");
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Stamps a successful sign-in.
    pub async fn touch_last_login(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = ?2, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.feed.publish(Table::Users, ChangeKind::Updated, id);
        Ok(())
    }
}
