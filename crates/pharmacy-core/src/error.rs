//! # Error Types
//!
//! Domain-specific error types for pharmacy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharmacy-core errors                                                  │
//! │  ├── AccessError      - Unauthenticated / Forbidden (access.rs)        │
//! │  ├── CoreError        - Business rule violations (this file)           │
//! │  └── ValidationError  - Input validation failures (this file)          │
//! │                                                                         │
//! │  pharmacy-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  pharmacy-api errors                                                   │
//! │  └── ApiError         - What the client sees (JSON + status)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::access::AccessError;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The API layer translates each
/// variant into a status code and a user-facing message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The access gate refused the action.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Drug cannot be found.
    #[error("Drug not found: {0}")]
    DrugNotFound(String),

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// ## When This Occurs
    /// - The requested quantity exceeds the drug's stock when the sale is read
    /// - A concurrent sale consumed the stock between read and decrement
    ///
    /// ## User Workflow
    /// ```text
    /// Record Sale (qty: 60)
    ///      │
    ///      ▼
    /// Stock check: available=40
    ///      │
    ///      ▼
    /// InsufficientStock { drug: "Paracetamol", available: 40, requested: 60 }
    ///      │
    ///      ▼
    /// UI shows: "Only 40 Paracetamol in stock"
    /// ```
    #[error("Insufficient stock for {drug}: available {available}, requested {requested}")]
    InsufficientStock {
        drug: String,
        available: i64,
        requested: i64,
    },

    /// The founder account cannot be modified through admin controls.
    #[error("Cannot {operation} the founder account")]
    ProtectedAccount { operation: String },

    /// Login failed. Deliberately does not say which half was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Login refused because an admin has not verified the account yet.
    #[error("Account is awaiting verification by an administrator")]
    AccountNotVerified,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a founder-protection refusal.
    pub fn protected(operation: impl Into<String>) -> Self {
        CoreError::ProtectedAccount {
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens, so a validation failure never leaves a
/// partial record behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., email already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            drug: "Paracetamol".to_string(),
            available: 40,
            requested: 60,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Paracetamol: available 40, requested 60"
        );

        let err = CoreError::protected("delete");
        assert_eq!(err.to_string(), "Cannot delete the founder account");

        let err = CoreError::protected("change the role of");
        assert_eq!(err.to_string(), "Cannot change the role of the founder account");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::Duplicate {
            field: "email".to_string(),
            value: "a@b.ug".to_string(),
        };
        assert_eq!(err.to_string(), "email 'a@b.ug' already exists");
    }

    #[test]
    fn test_access_and_validation_convert_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = AccessError::Unauthenticated.into();
        assert!(matches!(
            core_err,
            CoreError::Access(AccessError::Unauthenticated)
        ));
    }
}
