//! Dashboard, catalog browsing and catalog additions.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;

use pharmacy_core::{
    Action, DashboardOverview, Drug, InventoryItem, NewDrug, Supplier, EXPIRY_WARNING_DAYS,
};

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewSupplierRequest {
    pub name: String,
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Json<DashboardOverview>, ApiError> {
    current.authorize(Action::ViewDashboard)?;

    let today = Utc::now().date_naive();
    let overview = state.db.drugs().overview(today, EXPIRY_WARNING_DAYS).await?;
    Ok(Json(overview))
}

/// GET /api/drugs
pub async fn list_drugs(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Json<Vec<Drug>>, ApiError> {
    current.authorize(Action::BrowseCatalog)?;
    Ok(Json(state.db.drugs().list().await?))
}

/// GET /api/suppliers
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Json<Vec<Supplier>>, ApiError> {
    current.authorize(Action::BrowseCatalog)?;
    Ok(Json(state.db.suppliers().list().await?))
}

/// GET /api/inventory
pub async fn inventory(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    current.authorize(Action::ViewInventory)?;
    Ok(Json(state.db.drugs().inventory().await?))
}

/// POST /api/drugs
pub async fn add_drug(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<NewDrug>, JsonRejection>,
) -> Result<(StatusCode, Json<Drug>), ApiError> {
    let grant = current.authorize(Action::ManageCatalog)?;
    let Json(input) = body?;

    let drug = state.db.inventory().add_drug(&grant, &input).await?;
    Ok((StatusCode::CREATED, Json(drug)))
}

/// POST /api/suppliers
pub async fn add_supplier(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<NewSupplierRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    let grant = current.authorize(Action::ManageSuppliers)?;
    let Json(input) = body?;

    let supplier = state.db.inventory().add_supplier(&grant, &input.name).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}
