//! # Session Repository
//!
//! Server-side login sessions. A signed token is only honoured while its
//! session row exists and has not expired, so logging out (deleting the row)
//! kills the token immediately.

use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::new_id;

/// One login session.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a session for `user_id` lasting `lifetime`.
    pub async fn create(&self, user_id: &str, lifetime: Duration) -> DbResult<SessionRecord> {
        let now = Utc::now();
        let record = SessionRecord {
            id: new_id(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + lifetime,
        };

        debug!(session_id = %record.id, user_id = %user_id, "Creating session");

        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns the session if it exists and has not expired at `now`.
    pub async fn find_active(&self, id: &str, now: DateTime<Utc>) -> DbResult<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.filter(|r| r.expires_at > now))
    }

    /// Ends a session. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(session_id = %id, "Deleting session");

        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ends every session of a user, except `keep` when given.
    pub async fn delete_for_user(&self, user_id: &str, keep: Option<&str>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?1 AND (?2 IS NULL OR id != ?2)")
            .bind(user_id)
            .bind(keep)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %user_id, removed = result.rows_affected(), "Deleted user sessions");
        Ok(result.rows_affected())
    }

    /// Removes sessions that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
