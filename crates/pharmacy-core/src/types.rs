//! # Domain Types
//!
//! Core domain types used throughout Dawa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Supplier     │◄──│      Drug       │◄──│      Sale       │       │
//! │  │  id, name       │   │  price, stock   │   │  quantity_sold  │       │
//! │  └────────▲────────┘   └────────▲────────┘   │  total_price    │       │
//! │           │                     │            └────────┬────────┘       │
//! │           │            ┌────────┴────────┐            │ sold_by        │
//! │           └────────────│    Purchase     │            ▼                │
//! │                        │  quantity, cost │──────►┌─────────────────┐   │
//! │                        └─────────────────┘ entered│      User       │   │
//! │                                              _by  │  role, verified │   │
//! │                                                   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Purchases and sales are immutable once written. Every id is a UUID v4
//! string.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The single role assigned to a user.
///
/// Roles are flat: no role implies another. The access policy lists every
/// role allowed for each action explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pharmacist,
    Cashier,
    Procurement,
    Supervisor,
    /// System owner. Exactly one exists; created by provisioning only.
    Founder,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Pharmacist,
        Role::Cashier,
        Role::Procurement,
        Role::Supervisor,
        Role::Founder,
    ];

    /// Roles an admin may hand out. `Founder` is never assignable.
    pub const ASSIGNABLE: [Role; 5] = [
        Role::Admin,
        Role::Pharmacist,
        Role::Cashier,
        Role::Procurement,
        Role::Supervisor,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::Cashier => "cashier",
            Role::Procurement => "procurement",
            Role::Supervisor => "supervisor",
            Role::Founder => "founder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// User
// =============================================================================

/// An application user. The password hash never leaves pharmacy-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique, compared case-sensitively.
    pub email: String,
    pub role: Role,
    /// Set by an admin; unverified accounts cannot log in by default.
    pub verified: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_founder(&self) -> bool {
        self.role == Role::Founder
    }
}

/// Registration form submitted by an admin.
#[derive(Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Self-service profile edit: a user may change their own name and email.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

// =============================================================================
// Supplier
// =============================================================================

/// A drug supplier. Names are unique ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Drug
// =============================================================================

/// A catalog entry with its current stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Drug {
    pub id: String,
    /// Unique ignoring ASCII case.
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    /// Unit selling price in the smallest currency unit.
    pub price: i64,
    /// Never negative.
    pub stock_quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub supplier_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Drug {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price)
    }
}

/// Explicit catalog form for adding a drug.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewDrug {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub supplier_id: Option<String>,
}

/// A drug row with its supplier's name expanded, for the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock_quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
}

// =============================================================================
// Catalog Reference
// =============================================================================

/// How a purchase form names a supplier or drug.
///
/// ```text
/// {"id": "4f1c…"}         → must already exist
/// {"name": "Acme Ltd"}    → find by name ignoring case, else create
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CatalogRef {
    Id(String),
    Name(String),
}

// =============================================================================
// Purchase
// =============================================================================

/// A stock receipt from a supplier. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub drug_id: String,
    pub supplier_id: String,
    pub quantity_purchased: i64,
    pub unit_cost: i64,
    pub entered_by: String,
    /// When the purchase was entered into the system.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Business date printed on the supplier's invoice.
    #[ts(as = "String")]
    pub date_purchased: NaiveDate,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

impl Purchase {
    /// `quantity_purchased × unit_cost`.
    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_minor(self.unit_cost).multiply_quantity(self.quantity_purchased)
    }
}

/// Record Purchase form.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInput {
    pub drug: CatalogRef,
    pub supplier: CatalogRef,
    pub quantity_purchased: i64,
    pub unit_cost: i64,
    /// Defaults to today when omitted.
    #[ts(as = "Option<String>")]
    pub date_purchased: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

/// Outcome of a recorded purchase.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub supplier: Supplier,
    pub drug: Drug,
    pub supplier_created: bool,
    pub drug_created: bool,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub total_cost: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale of one drug. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub drug_id: String,
    pub quantity_sold: i64,
    /// `quantity_sold × drug price` at the moment of sale.
    pub total_price: i64,
    pub sold_by: String,
    #[ts(as = "String")]
    pub date_sold: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_minor(self.total_price)
    }
}

/// Record Sale form.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct SaleInput {
    pub drug_id: String,
    pub quantity_sold: i64,
}

/// Outcome of a recorded sale.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub drug: Drug,
    pub previous_stock: i64,
    pub new_stock: i64,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Landing-page counters for admins and supervisors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DashboardOverview {
    pub drug_count: i64,
    pub supplier_count: i64,
    pub units_on_hand: i64,
    pub out_of_stock: i64,
    /// Drugs whose expiry date falls within the warning window.
    pub expiring_soon: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn drug(stock: i64, price: i64) -> Drug {
        Drug {
            id: "d1".to_string(),
            name: "Paracetamol".to_string(),
            category: "Pain Relief".to_string(),
            description: None,
            price,
            stock_quantity: stock,
            expiry_date: None,
            supplier_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_founder_is_not_assignable() {
        assert!(!Role::ASSIGNABLE.contains(&Role::Founder));
        assert_eq!(Role::ASSIGNABLE.len() + 1, Role::ALL.len());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Procurement).unwrap();
        assert_eq!(json, "\"procurement\"");
    }

    #[test]
    fn test_drug_price_is_money() {
        let d = drug(100, 500);
        assert_eq!(d.price(), Money::from_minor(500));
        assert_eq!(d.price().multiply_quantity(10).minor(), 5000);
    }

    #[test]
    fn test_catalog_ref_json_shape() {
        let by_name: CatalogRef = serde_json::from_str(r#"{"name":"Acme Ltd"}"#).unwrap();
        assert_eq!(by_name, CatalogRef::Name("Acme Ltd".to_string()));

        let by_id: CatalogRef = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(by_id, CatalogRef::Id("abc".to_string()));
    }

    #[test]
    fn test_purchase_total_cost() {
        let p = Purchase {
            id: "p1".to_string(),
            drug_id: "d1".to_string(),
            supplier_id: "s1".to_string(),
            quantity_purchased: 50,
            unit_cost: 300,
            entered_by: "u1".to_string(),
            created_at: Utc::now(),
            date_purchased: Utc::now().date_naive(),
            expiry_date: None,
        };
        assert_eq!(p.total_cost().minor(), 15_000);
    }

    #[test]
    fn test_new_user_debug_hides_password() {
        let u = NewUser {
            name: "Amina".to_string(),
            email: "amina@example.ug".to_string(),
            password: "hunter22".to_string(),
            role: Role::Cashier,
        };
        let dbg = format!("{u:?}");
        assert!(!dbg.contains("hunter22"));
        assert!(dbg.contains("<redacted>"));
    }
}
