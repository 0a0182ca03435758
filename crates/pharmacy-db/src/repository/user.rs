//! # User Repository
//!
//! Database operations for staff accounts.
//!
//! The password hash is only ever read through [`StoredUser`], which the
//! login and password-change paths use. Everything else gets a plain
//! [`User`] with no credential attached.
//!
//! Founder protection is enforced twice: [`crate::accounts`] refuses with a
//! clear error, and the mutating statements here carry
//! `AND role != 'founder'` so no caller can slip past it.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::{Role, User};

const USER_COLUMNS: &str = "id, name, email, role, verified, created_at, updated_at";

/// A user row together with its password hash.
#[derive(Debug, Clone, FromRow)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub password_hash: String,
}

impl StoredUser {
    /// Splits into the public user and its hash.
    pub fn into_parts(self) -> (User, String) {
        let user = User {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            verified: self.verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (user, self.password_hash)
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user with an already-hashed password.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the email (exact match) is taken, or if a
    ///   second founder is inserted
    pub async fn insert(&self, user: &User, password_hash: &str) -> DbResult<()> {
        debug!(id = %user.id, email = %user.email, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, verified, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(user.role)
        .bind(user.verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == "users.email" => {
                DbError::duplicate("email", &user.email)
            }
            other => other,
        })?;

        Ok(())
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Loads a user and hash by email, for login.
    pub async fn find_credentials_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        let stored = sqlx::query_as::<_, StoredUser>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Loads a user and hash by id, for password changes.
    pub async fn find_credentials_by_id(&self, id: &str) -> DbResult<Option<StoredUser>> {
        let stored = sqlx::query_as::<_, StoredUser>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Lists all users, founder first, then by name.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY role = 'founder' DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Returns the founder, if provisioned.
    pub async fn find_founder(&self) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'founder'"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks whether `email` belongs to someone other than `except_id`.
    pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Updates a user's own name and email.
    pub async fn update_profile(&self, id: &str, name: &str, email: &str) -> DbResult<User> {
        debug!(id = %id, "Updating profile");

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = ?2, email = ?3, updated_at = ?4 WHERE id = ?1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email),
            other => other,
        })?;

        user.ok_or_else(|| DbError::not_found("User", id))
    }

    /// Replaces a user's password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating password hash");

        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Sets the verified flag on a non-founder user.
    ///
    /// Returns `None` when no non-founder user has this id.
    pub async fn set_verified(&self, id: &str, verified: bool) -> DbResult<Option<User>> {
        debug!(id = %id, verified, "Setting verified flag");

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET verified = ?2, updated_at = ?3 WHERE id = ?1 AND role != 'founder' RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(verified)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Changes the role of a non-founder user.
    ///
    /// Returns `None` when no non-founder user has this id.
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<Option<User>> {
        debug!(id = %id, role = %role, "Changing role");

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = ?2, updated_at = ?3 WHERE id = ?1 AND role != 'founder' RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Deletes a non-founder user.
    ///
    /// ## Errors
    /// - `ForeignKeyViolation` when purchases or sales reference the user
    ///
    /// Returns `false` when no non-founder user has this id.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1 AND role != 'founder'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
