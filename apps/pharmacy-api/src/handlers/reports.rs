//! The financial summary screen.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use pharmacy_core::summary::{summarize, DateRange, FinancialSummary, Period};
use pharmacy_core::Action;

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub period: Period,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/summary?period=monthly&from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn summary(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<FinancialSummary>, ApiError> {
    current.authorize(Action::ViewSummary)?;

    let range = DateRange {
        from: query.from,
        to: query.to,
    };
    let sales = state.db.sales().list(range).await?;
    let purchases = state.db.purchases().list(range).await?;

    Ok(Json(summarize(query.period, range, &sales, &purchases)?))
}
