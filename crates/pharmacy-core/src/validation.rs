//! # Validation Module
//!
//! Input validation for every form the application accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules, before any write                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Inventory engine (inside the transaction)                    │
//! │  └── Stock bound against the row actually read                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_quantity >= 0, quantity > 0, price >= 0)             │
//! │  ├── UNIQUE (email, supplier name, drug name)                          │
//! │  └── Foreign keys (ON DELETE RESTRICT)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmacy_core::validation::{validate_email, validate_quantity};
//!
//! assert!(validate_email("cashier@pharmacy.ug").is_ok());
//! assert!(validate_quantity("quantity_sold", 0).is_err());
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::{CatalogRef, NewDrug, NewUser, ProfileUpdate, PurchaseInput, Role, SaleInput};
use crate::{DRUG_CATEGORIES, MAX_LINE_QUANTITY, MAX_UNIT_AMOUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Minimum password length for new accounts and password changes.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text name field (person, drug or supplier).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape is checked: one `@` with something on both sides and a dot
/// in the domain. Deliverability is not our problem.
///
/// Emails are stored and compared exactly as typed, so surrounding
/// whitespace is rejected rather than silently trimmed.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a drug category against the fixed catalog list.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    if DRUG_CATEGORIES.contains(&category) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: "category".to_string(),
        allowed: DRUG_CATEGORIES.iter().map(|c| c.to_string()).collect(),
    })
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Rejects the founder role. Everything else may be assigned by an admin.
pub fn validate_assignable_role(role: Role) -> ValidationResult<()> {
    if Role::ASSIGNABLE.contains(&role) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: "role".to_string(),
        allowed: Role::ASSIGNABLE
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a purchase or sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost. Zero is allowed (free samples, donations).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_UNIT_AMOUNT
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_AMOUNT).contains(&amount) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_AMOUNT,
        });
    }

    Ok(())
}

/// Validates an opening stock level on the catalog form.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_LINE_QUANTITY).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

fn validate_catalog_ref(field: &str, reference: &CatalogRef) -> ValidationResult<()> {
    match reference {
        CatalogRef::Id(id) => validate_uuid(field, id),
        CatalogRef::Name(name) => validate_name(field, name),
    }
}

/// Validates the Record Purchase form.
pub fn validate_purchase_input(input: &PurchaseInput) -> ValidationResult<()> {
    validate_catalog_ref("supplier", &input.supplier)?;
    validate_catalog_ref("drug", &input.drug)?;
    validate_quantity("quantity_purchased", input.quantity_purchased)?;
    validate_amount("unit_cost", input.unit_cost)
}

/// Validates the Record Sale form. The stock bound is checked by the engine
/// against the row it reads.
pub fn validate_sale_input(input: &SaleInput) -> ValidationResult<()> {
    validate_uuid("drug_id", &input.drug_id)?;
    validate_quantity("quantity_sold", input.quantity_sold)
}

/// Validates the Add Drug catalog form.
pub fn validate_new_drug(input: &NewDrug) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_category(&input.category)?;
    validate_amount("price", input.price)?;
    validate_stock(input.stock_quantity)?;

    if let Some(description) = &input.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: MAX_DESCRIPTION_LEN,
            });
        }
    }

    if let Some(supplier_id) = &input.supplier_id {
        validate_uuid("supplier_id", supplier_id)?;
    }

    Ok(())
}

/// Validates the admin registration form.
pub fn validate_new_user(input: &NewUser) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    validate_assignable_role(input.role)
}

/// Validates a self-service profile edit.
pub fn validate_profile_update(input: &ProfileUpdate) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_email(&input.email)
}

// =============================================================================
// Unit Tests
// =============================================================================
