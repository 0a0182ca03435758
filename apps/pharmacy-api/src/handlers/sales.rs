//! Record Sale and the sale ledger.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use pharmacy_core::summary::DateRange;
use pharmacy_core::{Action, Sale, SaleInput, SaleReceipt};

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

/// POST /api/sales
pub async fn record_sale(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    body: Result<Json<SaleInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleReceipt>), ApiError> {
    let grant = current.authorize(Action::RecordSale)?;
    let Json(input) = body?;

    let receipt = state.db.inventory().record_sale(&grant, &input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/sales?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    current.authorize(Action::ViewSummary)?;
    Ok(Json(state.db.sales().list(range).await?))
}
