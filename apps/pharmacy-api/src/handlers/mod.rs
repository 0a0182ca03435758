//! Request handlers, one module per screen group.
//!
//! Every handler that does more than report health takes a
//! [`CurrentSession`](crate::session::CurrentSession) and passes the access
//! gate before touching storage.

pub mod auth;
pub mod catalog;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod users;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
        }),
    )
}
