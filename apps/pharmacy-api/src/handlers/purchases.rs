//! Record Purchase and the purchase ledger.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use pharmacy_core::summary::DateRange;
use pharmacy_core::{Action, Purchase, PurchaseInput, PurchaseReceipt};

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

/// POST /api/purchases
///
/// Supplier and drug may be given by id or by name; names that don't exist
/// yet are created inside the same transaction.
pub async fn record_purchase(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<PurchaseInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseReceipt>), ApiError> {
    let grant = current.authorize(Action::RecordPurchase)?;
    let Json(input) = body?;

    let receipt = state.db.inventory().record_purchase(&grant, &input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/purchases?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    current.authorize(Action::ViewSummary)?;
    Ok(Json(state.db.purchases().list(range).await?))
}
