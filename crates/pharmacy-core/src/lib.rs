//! # pharmacy-core: Pure Business Logic for Dawa POS
//!
//! Everything here is deterministic and free of I/O: the domain types, the
//! integer money type, input validation, the role-based access gate and the
//! financial summary math.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dawa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web UI (forms, tables)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pharmacy-api (axum)                          │   │
//! │  │    login, record_sale, record_purchase, manage_users, ...       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pharmacy-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │validation│ │ access  │ │ summary │ │   │
//! │  │   │  Drug   │ │  Money  │ │  rules   │ │ policy  │ │ periods │ │   │
//! │  │   │  Sale   │ │         │ │          │ │  gate   │ │ totals  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 pharmacy-db (Database Layer)                    │   │
//! │  │       SQLite, migrations, repositories, inventory engine        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Drug, Supplier, Purchase, Sale)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`access`] - Role policy table, sessions and the authorization gate
//! - [`summary`] - Income/expenditure aggregation by period
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmacy_core::access::{authorize, Action, Session};
//! use pharmacy_core::money::Money;
//!
//! let price = Money::from_minor(500);
//! assert_eq!(price.multiply_quantity(10).minor(), 5000);
//!
//! // Nobody logged in: every protected action is refused.
//! let session = Session::anonymous();
//! assert!(authorize(&session, Action::RecordSale).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod money;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, AccessError, Action, Grant, Session};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Drug categories offered by the catalog form.
pub const DRUG_CATEGORIES: [&str; 5] = [
    "Pain Relief",
    "Antibiotic",
    "Antihistamine",
    "Diabetes",
    "Other",
];

/// Category assigned to drugs created implicitly by a purchase.
pub const DEFAULT_DRUG_CATEGORY: &str = "Other";

/// Description assigned to drugs created implicitly by a purchase.
pub const AUTO_ADDED_DESCRIPTION: &str = "Auto-added during purchase";

/// Maximum quantity accepted on a single purchase or sale line.
///
/// ## Business Reason
/// Catches typos (an extra zero or two) before they hit stock levels.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest unit price or unit cost accepted, in the smallest currency unit.
///
/// A full line is then at most 10^15, so thousands of maximal lines still
/// sum inside an `i64`. Reports check their sums regardless.
pub const MAX_UNIT_AMOUNT: i64 = 1_000_000_000;

/// Number of days ahead that counts as "expiring soon" on the dashboard.
pub const EXPIRY_WARNING_DAYS: i64 = 30;
