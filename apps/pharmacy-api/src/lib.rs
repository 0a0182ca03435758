//! # pharmacy-api: HTTP Server for Dawa POS
//!
//! JSON endpoints for the pharmacy web front end.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales  {"drug_id": "...", "quantity_sold": 10}              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrentSession extractor   bearer token → Session (maybe anonymous)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  authorize(&session, Action::RecordSale) → Grant   or 401 / 403         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.inventory().record_sale(&grant, &input)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  201 SaleReceipt   or ApiError {"error": {"code", "message"}}           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod session;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use pharmacy_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            jwt: JwtManager::new(&config.jwt_secret),
            db,
            config,
        }
    }
}

/// Builds the full router.
pub fn create_router(state: Arc<AppState>) -> Router {
    use handlers::{auth, catalog, purchases, reports, sales, users};

    let api = Router::new()
        // Session and self-service
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_profile))
        .route("/me/password", put(auth::change_password))
        // Catalog
        .route("/dashboard", get(catalog::dashboard))
        .route("/drugs", get(catalog::list_drugs).post(catalog::add_drug))
        .route(
            "/suppliers",
            get(catalog::list_suppliers).post(catalog::add_supplier),
        )
        .route("/inventory", get(catalog::inventory))
        // Stock movements
        .route(
            "/purchases",
            get(purchases::list_purchases).post(purchases::record_purchase),
        )
        .route("/sales", get(sales::list_sales).post(sales::record_sale))
        .route("/summary", get(reports::summary))
        // Staff accounts
        .route("/users", get(users::list_users).post(users::register_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/users/:id/role", put(users::set_role))
        .route("/users/:id/verified", put(users::set_verified));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
