//! # Drug Repository
//!
//! Catalog rows and their live stock level.
//!
//! ## Stock Updates Are Atomic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Read-modify-write (lost update):                                   │
//! │    A reads 100        B reads 100                                   │
//! │    A writes 100-60    B writes 100-60     → 40, one sale lost       │
//! │                                                                     │
//! │  What we do instead, in one statement:                              │
//! │    UPDATE drugs SET stock_quantity = stock_quantity - 60            │
//! │    WHERE id = ? AND stock_quantity >= 60                            │
//! │    RETURNING stock_quantity                                         │
//! │                                                                     │
//! │    A → 40             B → no row (InsufficientStock)                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::{DashboardOverview, Drug, InventoryItem};

const DRUG_COLUMNS: &str = "id, name, category, description, price, stock_quantity, \
                            expiry_date, supplier_id, created_at, updated_at";

/// Stock and price captured by a successful decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub(crate) struct StockAfterSale {
    pub stock_quantity: i64,
    pub price: i64,
}

/// Repository for drug database operations.
#[derive(Debug, Clone)]
pub struct DrugRepository {
    pool: SqlitePool,
}

impl DrugRepository {
    /// Creates a new DrugRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DrugRepository { pool }
    }

    /// Lists the catalog by name (sale and purchase pick-lists).
    pub async fn list(&self) -> DbResult<Vec<Drug>> {
        let drugs = sqlx::query_as::<_, Drug>(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = drugs.len(), "Listed drugs");
        Ok(drugs)
    }

    /// Lists the catalog with each supplier's name expanded.
    pub async fn inventory(&self) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT
                d.id,
                d.name,
                d.category,
                d.description,
                d.price,
                d.stock_quantity,
                d.expiry_date,
                d.supplier_id,
                s.name AS supplier_name
            FROM drugs d
            LEFT JOIN suppliers s ON s.id = d.supplier_id
            ORDER BY d.name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Drug>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Inserts a catalog row outside any request, for seeding. `None` on a
    /// name clash.
    pub async fn create(&self, drug: &Drug) -> DbResult<Option<Drug>> {
        let mut conn = self.pool.acquire().await?;
        insert_if_absent(&mut conn, drug).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drugs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Dashboard counters as of `today`.
    pub async fn overview(&self, today: NaiveDate, warning_days: i64) -> DbResult<DashboardOverview> {
        let horizon = today + Duration::days(warning_days);

        let overview = sqlx::query_as::<_, DashboardOverview>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM drugs) AS drug_count,
                (SELECT COUNT(*) FROM suppliers) AS supplier_count,
                (SELECT COALESCE(SUM(stock_quantity), 0) FROM drugs) AS units_on_hand,
                (SELECT COUNT(*) FROM drugs WHERE stock_quantity = 0) AS out_of_stock,
                (SELECT COUNT(*) FROM drugs
                    WHERE expiry_date IS NOT NULL AND expiry_date <= ?1) AS expiring_soon
            "#,
        )
        .bind(horizon)
        .fetch_one(&self.pool)
        .await?;

        Ok(overview)
    }
}

// =============================================================================
// Connection-level operations (usable inside a transaction)
// =============================================================================

pub(crate) async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Drug>> {
    let drug = sqlx::query_as::<_, Drug>(&format!("SELECT {DRUG_COLUMNS} FROM drugs WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(drug)
}

/// Case-insensitive exact match on the trimmed name.
pub(crate) async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<Drug>> {
    let drug = sqlx::query_as::<_, Drug>(&format!(
        "SELECT {DRUG_COLUMNS} FROM drugs WHERE name = ?1 COLLATE NOCASE"
    ))
    .bind(name.trim())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(drug)
}

/// Inserts `drug` unless the name (ignoring case) is already in the catalog.
///
/// Returns the stored row, or `None` on a name clash.
pub(crate) async fn insert_if_absent(conn: &mut SqliteConnection, drug: &Drug) -> DbResult<Option<Drug>> {
    debug!(id = %drug.id, name = %drug.name, "Inserting drug if absent");

    let stored = sqlx::query_as::<_, Drug>(&format!(
        r#"
        INSERT INTO drugs ({DRUG_COLUMNS})
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT DO NOTHING
        RETURNING {DRUG_COLUMNS}
        "#
    ))
    .bind(&drug.id)
    .bind(drug.name.trim())
    .bind(&drug.category)
    .bind(&drug.description)
    .bind(drug.price)
    .bind(drug.stock_quantity)
    .bind(drug.expiry_date)
    .bind(&drug.supplier_id)
    .bind(drug.created_at)
    .bind(drug.updated_at)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stored)
}

/// Adds `quantity` to stock atomically. Returns the new level, or `None` if
/// the drug does not exist.
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<Option<i64>> {
    debug!(id = %id, quantity, "Incrementing stock");

    let stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE drugs
        SET stock_quantity = stock_quantity + ?2, updated_at = ?3
        WHERE id = ?1
        RETURNING stock_quantity
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock)
}

/// Removes `quantity` from stock only if enough is on hand.
///
/// Returns the new level and the unit price in effect, or `None` if the drug
/// is missing or short.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<Option<StockAfterSale>> {
    debug!(id = %id, quantity, "Decrementing stock");

    let after = sqlx::query_as::<_, StockAfterSale>(
        r#"
        UPDATE drugs
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        RETURNING stock_quantity, price
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(after)
}

/// Loads a drug that must exist.
pub(crate) async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Drug> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::Domain(pharmacy_core::CoreError::DrugNotFound(id.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_id;
    use crate::test_support::test_db;

    fn drug(name: &str, stock: i64, expiry: Option<NaiveDate>) -> Drug {
        let now = Utc::now();
        Drug {
            id: new_id(),
            name: name.to_string(),
            category: "Pain Relief".to_string(),
            description: None,
            price: 500,
            stock_quantity: stock,
            expiry_date: expiry,
            supplier_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_and_lookup() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let stored = insert_if_absent(&mut conn, &drug("Paracetamol", 100, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.stock_quantity, 100);

        assert!(insert_if_absent(&mut conn, &drug("PARACETAMOL", 5, None))
            .await
            .unwrap()
            .is_none());

        let found = find_by_name(&mut conn, "paracetamol").await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
    }

    #[tokio::test]
    async fn test_stock_moves_atomically_and_never_negative() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let d = insert_if_absent(&mut conn, &drug("Amoxicillin", 100, None))
            .await
            .unwrap()
            .unwrap();

        let after = decrement_stock(&mut conn, &d.id, 60).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 40);
        assert_eq!(after.price, 500);

        assert!(decrement_stock(&mut conn, &d.id, 60).await.unwrap().is_none());
        assert_eq!(increment_stock(&mut conn, &d.id, 50).await.unwrap(), Some(90));
        assert_eq!(increment_stock(&mut conn, "missing", 5).await.unwrap(), None);

        let err = require(&mut conn, "missing").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(pharmacy_core::CoreError::DrugNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overview_counts() {
        let db = test_db().await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert_if_absent(&mut conn, &drug("A", 10, NaiveDate::from_ymd_opt(2026, 10, 20)))
                .await
                .unwrap();
            insert_if_absent(&mut conn, &drug("B", 0, NaiveDate::from_ymd_opt(2027, 6, 1)))
                .await
                .unwrap();
            insert_if_absent(&mut conn, &drug("C", 5, None)).await.unwrap();
        }

        let overview = db.drugs().overview(today, 30).await.unwrap();
        assert_eq!(
            overview,
            DashboardOverview {
                drug_count: 3,
                supplier_count: 0,
                units_on_hand: 15,
                out_of_stock: 1,
                expiring_soon: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_inventory_expands_supplier_name() {
        let db = test_db().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            let supplier = crate::repository::supplier::insert(&mut conn, "Acme Ltd")
                .await
                .unwrap();
            let mut d = drug("Cetirizine", 20, None);
            d.supplier_id = Some(supplier.id);
            insert_if_absent(&mut conn, &d).await.unwrap();
            insert_if_absent(&mut conn, &drug("Insulin", 3, None)).await.unwrap();
        }

        let items = db.drugs().inventory().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Cetirizine");
        assert_eq!(items[0].supplier_name.as_deref(), Some("Acme Ltd"));
        assert_eq!(items[1].supplier_name, None);
    }
}
