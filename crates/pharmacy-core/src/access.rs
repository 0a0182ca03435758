//! # Access Control
//!
//! One policy table, one gate.
//!
//! ```text
//! ┌──────────────┐  authorize(&session, action)  ┌──────────────────────┐
//! │   Session    │──────────────────────────────►│   allowed_roles()    │
//! │ user | none  │                               │  action → &[Role]    │
//! └──────────────┘                               └──────────┬───────────┘
//!                                                           │
//!                 ┌─────────────────────────────────────────┼──────────┐
//!                 ▼                                         ▼          ▼
//!        Err(Unauthenticated)                    Err(Forbidden)   Ok(Grant)
//!        no user in session                      role not listed      │
//!                                                                     ▼
//!                                             engine operation consumes the
//!                                             grant, so nothing with side
//!                                             effects runs without one
//! ```
//!
//! Role matching is exact. There is no hierarchy: `Admin` is not implicitly
//! allowed to do what `Pharmacist` can; every row lists its roles.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::types::{Role, User};

// =============================================================================
// Actions
// =============================================================================

/// Every protected action in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Landing page and own profile.
    ViewHome,
    /// Change own name, email or password.
    EditOwnProfile,
    /// Counters for managers.
    ViewDashboard,
    /// Drug and supplier pick-lists used by the sale and purchase forms.
    BrowseCatalog,
    /// Full inventory table with supplier names.
    ViewInventory,
    /// Add a drug through the catalog form.
    ManageCatalog,
    /// Add a supplier explicitly.
    ManageSuppliers,
    RecordSale,
    RecordPurchase,
    /// Income/expenditure summaries and the raw purchase/sale ledgers.
    ViewSummary,
    /// Register, verify, re-role and delete users.
    ManageUsers,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::ViewHome,
        Action::EditOwnProfile,
        Action::ViewDashboard,
        Action::BrowseCatalog,
        Action::ViewInventory,
        Action::ManageCatalog,
        Action::ManageSuppliers,
        Action::RecordSale,
        Action::RecordPurchase,
        Action::ViewSummary,
        Action::ManageUsers,
    ];
}

// =============================================================================
// Policy Table
// =============================================================================

use Role::{Admin, Cashier, Founder, Pharmacist, Procurement, Supervisor};

const EVERYONE: &[Role] = &[Admin, Pharmacist, Cashier, Procurement, Supervisor, Founder];

/// The roles allowed to perform `action`.
///
/// ```text
///                    admin pharm cashier procure superv founder
/// ViewHome             ✓     ✓      ✓       ✓      ✓      ✓
/// EditOwnProfile       ✓     ✓      ✓       ✓      ✓      ✓
/// ViewDashboard        ✓                           ✓      ✓
/// BrowseCatalog        ✓     ✓      ✓       ✓             ✓
/// ViewInventory        ✓     ✓                            ✓
/// ManageCatalog        ✓     ✓                            ✓
/// ManageSuppliers      ✓     ✓              ✓             ✓
/// RecordSale           ✓     ✓      ✓                     ✓
/// RecordPurchase       ✓                    ✓             ✓
/// ViewSummary          ✓                           ✓      ✓
/// ManageUsers          ✓                                  ✓
/// ```
pub const fn allowed_roles(action: Action) -> &'static [Role] {
    match action {
        Action::ViewHome | Action::EditOwnProfile => EVERYONE,
        Action::ViewDashboard => &[Admin, Supervisor, Founder],
        Action::BrowseCatalog => &[Admin, Pharmacist, Cashier, Procurement, Founder],
        Action::ViewInventory => &[Admin, Pharmacist, Founder],
        Action::ManageCatalog => &[Admin, Pharmacist, Founder],
        Action::ManageSuppliers => &[Admin, Pharmacist, Procurement, Founder],
        Action::RecordSale => &[Admin, Pharmacist, Cashier, Founder],
        Action::RecordPurchase => &[Admin, Procurement, Founder],
        Action::ViewSummary => &[Admin, Supervisor, Founder],
        Action::ManageUsers => &[Admin, Founder],
    }
}

/// Checks a single (role, action) pair against the table.
pub fn is_allowed(role: Role, action: Action) -> bool {
    allowed_roles(action).contains(&role)
}

/// Actions a role may perform, for building the UI navigation.
pub fn permitted_actions(role: Role) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| is_allowed(role, *action))
        .collect()
}

// =============================================================================
// Errors
// =============================================================================

/// Why the gate refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No authenticated user in the session.
    #[error("Please log in to continue")]
    Unauthenticated,

    /// Authenticated, but the role is not listed for the action.
    #[error("Role '{role}' is not permitted to perform {action:?}")]
    Forbidden { role: Role, action: Action },
}

// =============================================================================
// Session
// =============================================================================

/// The caller's session, passed explicitly into every action.
///
/// A logged-out session and a never-logged-in session are the same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { user: None }
    }

    pub fn authenticated(user: User) -> Self {
        Session { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Clears all session state.
    pub fn logout(&mut self) {
        self.user = None;
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Proof that a session passed the gate for one specific action.
///
/// Only [`authorize`] can build one. Mutating operations take a `&Grant` and
/// call [`Grant::require`] with their own action before touching storage.
#[derive(Debug, Clone, Copy)]
pub struct Grant<'a> {
    user: &'a User,
    action: Action,
}

impl<'a> Grant<'a> {
    /// The authorised user (the acting user for audit columns).
    pub fn user(&self) -> &'a User {
        self.user
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Confirms this grant was issued for `action`.
    pub fn require(&self, action: Action) -> Result<&'a User, AccessError> {
        if self.action == action {
            Ok(self.user)
        } else {
            Err(AccessError::Forbidden {
                role: self.user.role,
                action,
            })
        }
    }
}

/// The access gate.
///
/// ## Example
/// ```rust
/// use pharmacy_core::access::{authorize, AccessError, Action, Session};
///
/// let session = Session::anonymous();
/// assert_eq!(
///     authorize(&session, Action::RecordSale).unwrap_err(),
///     AccessError::Unauthenticated
/// );
/// ```
pub fn authorize(session: &Session, action: Action) -> Result<Grant<'_>, AccessError> {
    let user = session.user().ok_or(AccessError::Unauthenticated)?;

    if !is_allowed(user.role, action) {
        return Err(AccessError::Forbidden {
            role: user.role,
            action,
        });
    }

    Ok(Grant { user, action })
}

// =============================================================================
// Unit Tests
// =============================================================================
