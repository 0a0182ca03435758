//! Resolving a request to a [`Session`].
//!
//! ```text
//! Authorization: Bearer <jwt>
//!      │
//!      ├─ no header / bad signature / expired ───────────► anonymous
//!      ├─ session row gone (logout, password change) ─────► anonymous
//!      ├─ user deleted, or unverified while required ─────► anonymous
//!      ▼
//! authenticated(user as stored right now)
//! ```
//!
//! Handlers never see the token; they get a `Session` value and hand it to
//! the access gate.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use tracing::debug;

use pharmacy_core::access::{authorize, Grant};
use pharmacy_core::{AccessError, Action, Session};

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::AppState;

/// The caller's session plus the server-side session id backing it.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session: Session,
    pub session_id: Option<String>,
}

impl CurrentSession {
    pub fn anonymous() -> Self {
        CurrentSession {
            session: Session::anonymous(),
            session_id: None,
        }
    }

    /// Passes the access gate for `action`.
    pub fn authorize(&self, action: Action) -> Result<Grant<'_>, AccessError> {
        authorize(&self.session, action)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
        else {
            return Ok(CurrentSession::anonymous());
        };

        resolve(state, token).await
    }
}

async fn resolve(state: &AppState, token: &str) -> Result<CurrentSession, ApiError> {
    let Some(claims) = state.jwt.validate(token) else {
        debug!("Rejected malformed or expired token");
        return Ok(CurrentSession::anonymous());
    };

    let Some(record) = state.db.sessions().find_active(&claims.sid, Utc::now()).await? else {
        debug!(session_id = %claims.sid, "Token refers to a closed session");
        return Ok(CurrentSession::anonymous());
    };

    if record.user_id != claims.sub {
        debug!(session_id = %claims.sid, "Token subject does not own the session");
        return Ok(CurrentSession::anonymous());
    }

    let Some(user) = state.db.users().get_by_id(&record.user_id).await? else {
        return Ok(CurrentSession::anonymous());
    };

    if state.config.require_verified_login && !user.verified {
        debug!(user_id = %user.id, "Session belongs to an unverified account");
        return Ok(CurrentSession::anonymous());
    }

    Ok(CurrentSession {
        session: Session::authenticated(user),
        session_id: Some(record.id),
    })
}
