//! Staff account administration.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use pharmacy_core::validation::validate_new_user;
use pharmacy_core::{Action, NewUser, Role, User};

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SetVerifiedRequest {
    pub verified: bool,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Json<Vec<User>>, ApiError> {
    let grant = current.authorize(Action::ManageUsers)?;
    Ok(Json(state.db.accounts().list(&grant).await?))
}

/// POST /api/users
///
/// New accounts start unverified.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let grant = current.authorize(Action::ManageUsers)?;
    let Json(input) = body?;

    // Reject bad input before paying for a hash.
    validate_new_user(&input)?;
    let password_hash = hash_password(&input.password).await?;

    let user = state
        .db
        .accounts()
        .register(&grant, &input, &password_hash)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id/role
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Path(id): Path<String>,
    body: Result<Json<SetRoleRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let grant = current.authorize(Action::ManageUsers)?;
    let Json(input) = body?;

    let user = state.db.accounts().set_role(&grant, &id, input.role).await?;
    Ok(Json(user))
}

/// PUT /api/users/:id/verified
pub async fn set_verified(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Path(id): Path<String>,
    body: Result<Json<SetVerifiedRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let grant = current.authorize(Action::ManageUsers)?;
    let Json(input) = body?;

    let user = state
        .db
        .accounts()
        .set_verified(&grant, &id, input.verified)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let grant = current.authorize(Action::ManageUsers)?;
    state.db.accounts().delete(&grant, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
