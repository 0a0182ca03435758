//! # Purchase Repository
//!
//! The purchase ledger. Rows are insert-only: there is no update or delete.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::date_range_clause;
use crate::error::DbResult;
use pharmacy_core::summary::DateRange;
use pharmacy_core::Purchase;

const PURCHASE_COLUMNS: &str = "id, drug_id, supplier_id, quantity_purchased, unit_cost, \
                                entered_by, created_at, date_purchased, expiry_date";

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchases entered within `range`, newest first.
    pub async fn list(&self, range: DateRange) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE {} ORDER BY created_at DESC",
            date_range_clause("created_at")
        ))
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = purchases.len(), "Listed purchases");
        Ok(purchases)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
    debug!(
        id = %purchase.id,
        drug_id = %purchase.drug_id,
        supplier_id = %purchase.supplier_id,
        quantity = purchase.quantity_purchased,
        "Inserting purchase"
    );

    sqlx::query(&format!(
        "INSERT INTO purchases ({PURCHASE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ))
    .bind(&purchase.id)
    .bind(&purchase.drug_id)
    .bind(&purchase.supplier_id)
    .bind(purchase.quantity_purchased)
    .bind(purchase.unit_cost)
    .bind(&purchase.entered_by)
    .bind(purchase.created_at)
    .bind(purchase.date_purchased)
    .bind(purchase.expiry_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
