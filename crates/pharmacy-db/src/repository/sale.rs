//! # Sale Repository
//!
//! The sale ledger. Rows are insert-only: there is no update or delete.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::date_range_clause;
use crate::error::DbResult;
use pharmacy_core::summary::DateRange;
use pharmacy_core::Sale;

const SALE_COLUMNS: &str = "id, drug_id, quantity_sold, total_price, sold_by, date_sold";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales made within `range`, newest first.
    pub async fn list(&self, range: DateRange) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE {} ORDER BY date_sold DESC",
            date_range_clause("date_sold")
        ))
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(
        id = %sale.id,
        drug_id = %sale.drug_id,
        quantity = sale.quantity_sold,
        total = sale.total_price,
        "Inserting sale"
    );

    sqlx::query(&format!(
        "INSERT INTO sales ({SALE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ))
    .bind(&sale.id)
    .bind(&sale.drug_id)
    .bind(sale.quantity_sold)
    .bind(sale.total_price)
    .bind(&sale.sold_by)
    .bind(sale.date_sold)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
