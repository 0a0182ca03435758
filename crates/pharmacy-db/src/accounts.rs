//! # Account Administration
//!
//! Staff registration and management, self-service profile edits, and the
//! one-shot founder bootstrap.
//!
//! Password hashing happens in the API layer; this module only ever sees
//! the finished hash.
//!
//! ## Founder Protection
//! ```text
//! set_verified / set_role / delete (target = founder)
//!      │
//!      ▼
//! AccountAdmin loads the target → is_founder() → ProtectedAccount
//!      │  (a racing caller that skips this check still hits)
//!      ▼
//! UPDATE/DELETE ... WHERE id = ? AND role != 'founder' → no row
//! ```

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::inventory::FindOrCreate;
use crate::new_id;
use crate::repository::{session::SessionRepository, user::UserRepository};
use pharmacy_core::validation::{
    validate_assignable_role, validate_email, validate_name, validate_new_user,
    validate_profile_update,
};
use pharmacy_core::{Action, CoreError, Grant, NewUser, ProfileUpdate, Role, User, ValidationError};

/// User management on top of the user and session repositories.
#[derive(Debug, Clone)]
pub struct AccountAdmin {
    users: UserRepository,
    sessions: SessionRepository,
}

impl AccountAdmin {
    pub fn new(pool: SqlitePool) -> Self {
        AccountAdmin {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
        }
    }

    // =========================================================================
    // Admin operations (ManageUsers)
    // =========================================================================

    /// Registers a new staff account. New accounts start unverified.
    ///
    /// ## Errors
    /// - `Domain(Validation(Duplicate))` if the email is taken
    /// - `Domain(Validation(NotAllowed))` for the founder role
    pub async fn register(
        &self,
        grant: &Grant<'_>,
        input: &NewUser,
        password_hash: &str,
    ) -> DbResult<User> {
        let admin = grant.require(Action::ManageUsers)?;
        validate_new_user(input)?;

        if self.users.email_taken(&input.email, None).await? {
            return Err(duplicate_email(&input.email));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: input.email.clone(),
            role: input.role,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        self.users
            .insert(&user, password_hash)
            .await
            .map_err(email_clash)?;

        info!(user_id = %user.id, role = %user.role, by = %admin.id, "User registered");
        Ok(user)
    }

    /// Lists all accounts, founder first.
    pub async fn list(&self, grant: &Grant<'_>) -> DbResult<Vec<User>> {
        grant.require(Action::ManageUsers)?;
        self.users.list().await
    }

    /// Marks an account verified or unverified.
    pub async fn set_verified(&self, grant: &Grant<'_>, id: &str, verified: bool) -> DbResult<User> {
        let admin = grant.require(Action::ManageUsers)?;
        self.load_unprotected(id, "change verification of").await?;

        let user = self
            .users
            .set_verified(id, verified)
            .await?
            .ok_or_else(|| CoreError::protected("change verification of"))?;

        info!(user_id = %id, verified, by = %admin.id, "Verification changed");
        Ok(user)
    }

    /// Changes an account's role. The founder role is never assignable.
    pub async fn set_role(&self, grant: &Grant<'_>, id: &str, role: Role) -> DbResult<User> {
        let admin = grant.require(Action::ManageUsers)?;
        validate_assignable_role(role)?;
        self.load_unprotected(id, "change the role of").await?;

        let user = self
            .users
            .set_role(id, role)
            .await?
            .ok_or_else(|| CoreError::protected("change the role of"))?;

        info!(user_id = %id, role = %role, by = %admin.id, "Role changed");
        Ok(user)
    }

    /// Deletes an account.
    ///
    /// ## Errors
    /// - `ForeignKeyViolation` if purchases or sales reference the user
    pub async fn delete(&self, grant: &Grant<'_>, id: &str) -> DbResult<()> {
        let admin = grant.require(Action::ManageUsers)?;
        self.load_unprotected(id, "delete").await?;

        if !self.users.delete(id).await? {
            return Err(CoreError::protected("delete").into());
        }

        info!(user_id = %id, by = %admin.id, "User deleted");
        Ok(())
    }

    async fn load_unprotected(&self, id: &str, operation: &str) -> DbResult<User> {
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()))?;

        if user.is_founder() {
            warn!(user_id = %id, operation, "Refused change to founder account");
            return Err(CoreError::protected(operation).into());
        }

        Ok(user)
    }

    // =========================================================================
    // Self-service (EditOwnProfile)
    // =========================================================================

    /// Updates the caller's own name and email.
    pub async fn update_profile(&self, grant: &Grant<'_>, input: &ProfileUpdate) -> DbResult<User> {
        let me = grant.require(Action::EditOwnProfile)?;
        validate_profile_update(input)?;

        if self.users.email_taken(&input.email, Some(&me.id)).await? {
            return Err(duplicate_email(&input.email));
        }

        let user = self
            .users
            .update_profile(&me.id, input.name.trim(), &input.email)
            .await
            .map_err(email_clash)?;

        debug!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Replaces the caller's password hash and signs out their other
    /// sessions. The caller verifies the current password first.
    ///
    /// Returns how many sessions were revoked.
    pub async fn change_password(
        &self,
        grant: &Grant<'_>,
        new_hash: &str,
        keep_session: Option<&str>,
    ) -> DbResult<u64> {
        let me = grant.require(Action::EditOwnProfile)?;

        self.users.update_password(&me.id, new_hash).await?;
        let revoked = self.sessions.delete_for_user(&me.id, keep_session).await?;

        info!(user_id = %me.id, revoked, "Password changed");
        Ok(revoked)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Opens a session for a user who has already proven their password.
    pub async fn open_session(
        &self,
        user: &User,
        lifetime: Duration,
    ) -> DbResult<crate::SessionRecord> {
        let record = self.sessions.create(&user.id, lifetime).await?;
        info!(user_id = %user.id, session_id = %record.id, "Session opened");
        Ok(record)
    }

    /// Closes one session. Closing an unknown session is not an error.
    pub async fn close_session(&self, session_id: &str) -> DbResult<()> {
        if self.sessions.delete(session_id).await? {
            info!(session_id = %session_id, "Session closed");
        }
        Ok(())
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Creates the founder account if none exists.
    ///
    /// Runs outside the access gate: it is only reachable from the
    /// `provision-founder` command, never from a request.
    pub async fn provision_founder(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> DbResult<FindOrCreate<User>> {
        if let Some(existing) = self.users.find_founder().await? {
            info!(user_id = %existing.id, "Founder already provisioned");
            return Ok(FindOrCreate::Found(existing));
        }

        validate_name("name", name)?;
        validate_email(email)?;

        if self.users.email_taken(email, None).await? {
            return Err(duplicate_email(email));
        }

        let now = Utc::now();
        let founder = User {
            id: new_id(),
            name: name.trim().to_string(),
            email: email.to_string(),
            role: Role::Founder,
            verified: true,
            created_at: now,
            updated_at: now,
        };

        match self.users.insert(&founder, password_hash).await {
            Ok(()) => {}
            // Lost a race with another provisioner on the single-founder index.
            Err(DbError::UniqueViolation { field, .. }) if field == "users.role" => {
                let existing = self
                    .users
                    .find_founder()
                    .await?
                    .ok_or_else(|| DbError::Internal("founder index clash without a founder".into()))?;
                return Ok(FindOrCreate::Found(existing));
            }
            Err(e) => return Err(email_clash(e)),
        }

        info!(user_id = %founder.id, email = %founder.email, "Founder provisioned");
        Ok(FindOrCreate::Created(founder))
    }
}

fn duplicate_email(email: &str) -> DbError {
    ValidationError::Duplicate {
        field: "email".to_string(),
        value: email.to_string(),
    }
    .into()
}

/// Turns the repository's email uniqueness error into the form error.
fn email_clash(err: DbError) -> DbError {
    match err {
        DbError::UniqueViolation { field, value } if field == "email" => duplicate_email(&value),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
