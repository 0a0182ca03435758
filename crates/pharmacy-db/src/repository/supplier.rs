//! # Supplier Repository
//!
//! Supplier names are unique ignoring ASCII case (`COLLATE NOCASE` index),
//! so "Acme Ltd" and "ACME LTD" are the same supplier.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::new_id;
use pharmacy_core::Supplier;

const SUPPLIER_COLUMNS: &str = "id, name, created_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name).await
    }

    /// Inserts a supplier outside any request, for seeding.
    pub async fn create(&self, name: &str) -> DbResult<Supplier> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, name).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations (usable inside a transaction)
// =============================================================================

pub(crate) async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(supplier)
}

/// Case-insensitive exact match on the trimmed name.
pub(crate) async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?1 COLLATE NOCASE"
    ))
    .bind(name.trim())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(supplier)
}

/// Inserts a supplier unless one with the same name (ignoring case) exists.
///
/// Returns the new row, or `None` if the name was already taken.
pub(crate) async fn insert_if_absent(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Supplier>> {
    let name = name.trim();
    debug!(name = %name, "Inserting supplier if absent");

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers (id, name, created_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT DO NOTHING RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(new_id())
    .bind(name)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(supplier)
}

/// Inserts a supplier, failing if the name is already taken.
pub(crate) async fn insert(conn: &mut SqliteConnection, name: &str) -> DbResult<Supplier> {
    insert_if_absent(conn, name)
        .await?
        .ok_or_else(|| DbError::duplicate("supplier", name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_names_match_ignoring_case() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let created = insert(&mut conn, "  Acme Ltd ").await.unwrap();
        assert_eq!(created.name, "Acme Ltd");

        let found = find_by_name(&mut conn, "ACME LTD").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(insert_if_absent(&mut conn, "acme ltd").await.unwrap().is_none());
        let err = insert(&mut conn, "acme ltd").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        drop(conn);

        assert_eq!(db.suppliers().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let db = test_db().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, "zenith pharma").await.unwrap();
            insert(&mut conn, "Acme Ltd").await.unwrap();
            insert(&mut conn, "Medipark").await.unwrap();
        }

        let names: Vec<String> = db
            .suppliers()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Acme Ltd", "Medipark", "zenith pharma"]);
    }
}
