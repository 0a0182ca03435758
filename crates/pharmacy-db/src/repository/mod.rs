//! # Repository Module
//!
//! One repository per table.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                      InventoryEngine / AccountAdmin      │
//! │       │                                   │                             │
//! │       │ db.drugs().inventory()            │ pool.begin()                │
//! │       ▼                                   ▼                             │
//! │  DrugRepository (pool)            drug::insert_if_absent(&mut tx, …)   │
//! │  ├── list / inventory                     drug::increment_stock(…)     │
//! │  ├── get_by_id / find_by_name             sale::insert(&mut tx, …)     │
//! │  └── overview                                                          │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │                SQLite Database                                         │
//! │                                                                         │
//! │  Pool-level methods serve read screens. Connection-level functions     │
//! │  (`&mut SqliteConnection`) let the engine run several steps inside     │
//! │  one transaction.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Accounts and credentials
//! - [`session::SessionRepository`] - Login sessions
//! - [`supplier::SupplierRepository`] - Suppliers
//! - [`drug::DrugRepository`] - Catalog and stock
//! - [`purchase::PurchaseRepository`] - Purchase ledger
//! - [`sale::SaleRepository`] - Sale ledger

pub mod drug;
pub mod purchase;
pub mod sale;
pub mod session;
pub mod supplier;
pub mod user;

/// SQL fragment restricting a timestamp or date column to an optional
/// inclusive `[?1, ?2]` date range.
pub(crate) fn date_range_clause(column: &str) -> String {
    format!(
        "(?1 IS NULL OR substr({column}, 1, 10) >= ?1) AND (?2 IS NULL OR substr({column}, 1, 10) <= ?2)"
    )
}
