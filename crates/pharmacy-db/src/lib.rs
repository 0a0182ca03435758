//! # pharmacy-db: Database Layer for Dawa POS
//!
//! SQLite storage for users, sessions, the drug catalog, purchases and
//! sales, plus the transactional engine that records purchases and sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dawa POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │  authorize(&session, Action::RecordSale) → Grant               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   pharmacy-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────────┐  ┌────────────────┐  ┌────────────────────┐ │   │
//! │  │  │   Database    │  │ InventoryEngine│  │   Repositories     │ │   │
//! │  │  │   (pool.rs)   │  │ AccountAdmin   │  │ drug, supplier,    │ │   │
//! │  │  │               │  │ (take a Grant) │─►│ purchase, sale,    │ │   │
//! │  │  │  SqlitePool   │◄─│  transactions  │  │ user, session      │ │   │
//! │  │  └───────────────┘  └────────────────┘  └────────────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite (WAL, foreign keys on, migrations/sqlite/*.sql)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`inventory`] - Record purchase / record sale / catalog additions
//! - [`accounts`] - User registration and administration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharmacy_core::access::{authorize, Action, Session};
//! use pharmacy_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pharmacy.db")).await?;
//!
//! let grant = authorize(&session, Action::RecordSale)?;
//! let receipt = db.inventory().record_sale(&grant, &input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accounts;
pub mod error;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use accounts::AccountAdmin;
pub use error::{DbError, DbResult};
pub use inventory::{FindOrCreate, InventoryEngine};
pub use pool::{Database, DbConfig};

pub use repository::drug::DrugRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::session::{SessionRecord, SessionRepository};
pub use repository::supplier::SupplierRepository;
pub use repository::user::{StoredUser, UserRepository};

/// Generates a new primary key.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for the crate's async tests.

    use chrono::Utc;
    use pharmacy_core::{Role, User};

    use crate::{new_id, Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A database file in a fresh temp dir, pooled over several connections
    /// so transactions really run side by side. Keep the dir alive.
    pub async fn file_db(max_connections: u32) -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("pharmacy.db")).max_connections(max_connections);
        let db = Database::new(config).await.unwrap();
        (dir, db)
    }

    /// Inserts a verified user with a placeholder hash.
    pub async fn insert_user(db: &Database, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: format!("Test {role}"),
            email: format!("{}-{}@pharmacy.ug", role, &new_id()[..8]),
            role,
            verified: true,
            created_at: now,
            updated_at: now,
        };
        db.users()
            .insert(&user, "$argon2id$v=19$placeholder")
            .await
            .unwrap();
        user
    }
}
