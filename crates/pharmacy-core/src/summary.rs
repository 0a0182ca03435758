//! # Financial Summary
//!
//! Groups sales (income) and purchases (expenditure) into daily, monthly or
//! yearly buckets and computes the overall net position.
//!
//! ```text
//! sales ─────► bucket by date_sold ──► Σ total_price ──┐
//!                                                      ├─► net = income − expenditure
//! purchases ─► bucket by created_at ─► Σ qty × cost ───┘
//! ```
//!
//! Purchases are bucketed by the time they were entered, not the invoice
//! date, so a late-entered invoice lands in the period it was booked.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Purchase, Sale};

/// Bucket width for a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    #[default]
    Monthly,
    Yearly,
}

impl Period {
    /// Bucket label for a date: `2026-10-17`, `2026-10` or `2026`.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Period::Daily => date.format("%Y-%m-%d").to_string(),
            Period::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Period::Yearly => format!("{:04}", date.year()),
        }
    }
}

/// Inclusive date range filter. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    fn contains_instant(&self, at: DateTime<Utc>) -> bool {
        self.contains(at.date_naive())
    }
}

/// Total for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PeriodTotal {
    pub period: String,
    pub total: Money,
}

/// The Summary screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub period: Period,
    /// Ascending by bucket label.
    pub sales: Vec<PeriodTotal>,
    /// Ascending by bucket label.
    pub purchases: Vec<PeriodTotal>,
    pub total_income: Money,
    pub total_expenditure: Money,
    pub net_profit: Money,
}

fn overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    }
    .into()
}

fn bucket(
    period: Period,
    entries: &[(DateTime<Utc>, Money)],
    field: &str,
) -> CoreResult<Vec<PeriodTotal>> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for (at, amount) in entries {
        let total = totals.entry(period.label(at.date_naive())).or_default();
        *total = total.checked_add(*amount).ok_or_else(|| overflow(field))?;
    }

    Ok(totals
        .into_iter()
        .map(|(period, total)| PeriodTotal { period, total })
        .collect())
}

/// Builds the financial summary for `range` at `period` granularity.
///
/// ## Errors
/// - `Validation(OutOfRange)` if a line or running total does not fit in
///   an `i64`; nothing is wrapped or truncated.
pub fn summarize(
    period: Period,
    range: DateRange,
    sales: &[Sale],
    purchases: &[Purchase],
) -> CoreResult<FinancialSummary> {
    let income: Vec<(DateTime<Utc>, Money)> = sales
        .iter()
        .filter(|s| range.contains_instant(s.date_sold))
        .map(|s| (s.date_sold, s.total_price()))
        .collect();
    let expenditure: Vec<(DateTime<Utc>, Money)> = purchases
        .iter()
        .filter(|p| range.contains_instant(p.created_at))
        .map(|p| {
            Money::from_minor(p.unit_cost)
                .checked_multiply_quantity(p.quantity_purchased)
                .map(|cost| (p.created_at, cost))
                .ok_or_else(|| overflow("purchase_cost"))
        })
        .collect::<CoreResult<_>>()?;

    let total_income = Money::checked_sum(income.iter().map(|(_, amount)| *amount))
        .ok_or_else(|| overflow("total_income"))?;
    let total_expenditure = Money::checked_sum(expenditure.iter().map(|(_, amount)| *amount))
        .ok_or_else(|| overflow("total_expenditure"))?;
    let net_profit = total_income
        .checked_sub(total_expenditure)
        .ok_or_else(|| overflow("net_profit"))?;

    Ok(FinancialSummary {
        period,
        sales: bucket(period, &income, "total_income")?,
        purchases: bucket(period, &expenditure, "total_expenditure")?,
        total_income,
        total_expenditure,
        net_profit,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
