//! Login, logout and the caller's own account.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pharmacy_core::access::permitted_actions;
use pharmacy_core::validation::validate_password;
use pharmacy_core::{Action, CoreError, ProfileUpdate, User, ValidationError};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    pub permissions: Vec<Action>,
}

/// The caller and what they may do, so the UI can show only the screens
/// the role reaches.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub permissions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body?;

    // Exact match: addresses differing only in case are different accounts.
    let Some(stored) = state
        .db
        .users()
        .find_credentials_by_email(&request.email)
        .await?
    else {
        warn!(email = %request.email, "Login failed: unknown email");
        return Err(CoreError::InvalidCredentials.into());
    };
    let (user, password_hash) = stored.into_parts();

    if !verify_password(&request.password, &password_hash).await {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(CoreError::InvalidCredentials.into());
    }

    if state.config.require_verified_login && !user.verified {
        warn!(user_id = %user.id, "Login refused: account not verified");
        return Err(CoreError::AccountNotVerified.into());
    }

    let lifetime = Duration::seconds(state.config.session_lifetime_secs);
    let record = state.db.accounts().open_session(&user, lifetime).await?;
    let token = state.jwt.issue(&user.id, &record.id, record.expires_at)?;

    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(Json(LoginResponse {
        token,
        expires_at: record.expires_at,
        permissions: permitted_actions(user.role),
        user,
    }))
}

/// POST /api/auth/logout
///
/// Always succeeds; an anonymous caller has nothing to close.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<StatusCode, ApiError> {
    if let Some(session_id) = &current.session_id {
        state.db.accounts().close_session(session_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(current: CurrentSession) -> Result<Json<MeResponse>, ApiError> {
    let grant = current.authorize(Action::ViewHome)?;
    let user = grant.user().clone();

    Ok(Json(MeResponse {
        permissions: permitted_actions(user.role),
        user,
    }))
}

/// PUT /api/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let grant = current.authorize(Action::EditOwnProfile)?;
    let Json(input) = body?;

    let user = state.db.accounts().update_profile(&grant, &input).await?;
    Ok(Json(user))
}

/// PUT /api/me/password
///
/// Other sessions of the same user are signed out; the caller's stays.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let grant = current.authorize(Action::EditOwnProfile)?;
    let Json(request) = body?;
    validate_password(&request.new_password)?;

    let (_, stored_hash) = state
        .db
        .users()
        .find_credentials_by_id(&grant.user().id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(grant.user().id.clone()))?
        .into_parts();

    if !verify_password(&request.current_password, &stored_hash).await {
        return Err(ValidationError::InvalidFormat {
            field: "current_password".to_string(),
            reason: "does not match".to_string(),
        }
        .into());
    }

    let new_hash = hash_password(&request.new_password).await?;
    state
        .db
        .accounts()
        .change_password(&grant, &new_hash, current.session_id.as_deref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
