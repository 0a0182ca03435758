//! # Inventory Engine
//!
//! Records purchases and sales, and adds catalog entries.
//!
//! ## Record Purchase
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. resolve supplier   {"id"} → must exist                            │
//! │                          {"name"} → find-or-create (ignoring case)      │
//! │    2. resolve drug       {"id"} → must exist                            │
//! │                          {"name"} → find-or-create, new drugs get:      │
//! │                             category "Other", price = unit_cost,        │
//! │                             stock 0, the resolved supplier              │
//! │    3. INSERT purchase    entered_by = grant user, created_at = now      │
//! │    4. stock_quantity = stock_quantity + quantity   (one statement)      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing from steps      │
//! │  1-4 survives, including a freshly created supplier or drug.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE drugs SET stock_quantity = stock_quantity - q              │
//! │         WHERE id = ? AND stock_quantity >= q                            │
//! │         RETURNING stock_quantity, price                                 │
//! │       no row → DrugNotFound | InsufficientStock                         │
//! │    2. total_price = q × price (price in effect right now)               │
//! │    3. INSERT sale                                                       │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes a [`Grant`] and checks it was issued for its own
//! action before the transaction opens.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::new_id;
use crate::repository::{drug, purchase, sale, supplier};
use pharmacy_core::validation::{
    validate_name, validate_new_drug, validate_purchase_input, validate_sale_input,
};
use pharmacy_core::{
    Action, CatalogRef, CoreError, Drug, Grant, Money, NewDrug, Purchase, PurchaseInput,
    PurchaseReceipt, Sale, SaleInput, SaleReceipt, Supplier, ValidationError,
    AUTO_ADDED_DESCRIPTION, DEFAULT_DRUG_CATEGORY,
};

// =============================================================================
// Find-or-create
// =============================================================================

/// Result of resolving a reference by name: an existing row, or one just
/// created. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOrCreate<T> {
    Found(T),
    Created(T),
}

impl<T> FindOrCreate<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, FindOrCreate::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            FindOrCreate::Found(v) | FindOrCreate::Created(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            FindOrCreate::Found(v) | FindOrCreate::Created(v) => v,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Purchase, sale and catalog operations.
#[derive(Debug, Clone)]
pub struct InventoryEngine {
    pool: SqlitePool,
}

impl InventoryEngine {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryEngine { pool }
    }

    /// Records a purchase. See the module docs for the step order.
    ///
    /// ## Errors
    /// - `Domain(Access(Forbidden))` if `grant` is not for `RecordPurchase`
    /// - `Domain(Validation(..))` for bad input, before anything is written
    /// - `Domain(SupplierNotFound | DrugNotFound)` for an unknown id
    pub async fn record_purchase(
        &self,
        grant: &Grant<'_>,
        input: &PurchaseInput,
    ) -> DbResult<PurchaseReceipt> {
        let user = grant.require(Action::RecordPurchase)?;
        validate_purchase_input(input)?;

        debug!(
            user_id = %user.id,
            supplier = ?input.supplier,
            drug = ?input.drug,
            quantity = input.quantity_purchased,
            "Recording purchase"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let supplier = resolve_supplier(&mut tx, &input.supplier).await?;
        let drug = resolve_drug(&mut tx, input, supplier.get()).await?;

        let now = Utc::now();
        let record = Purchase {
            id: new_id(),
            drug_id: drug.get().id.clone(),
            supplier_id: supplier.get().id.clone(),
            quantity_purchased: input.quantity_purchased,
            unit_cost: input.unit_cost,
            entered_by: user.id.clone(),
            created_at: now,
            date_purchased: input.date_purchased.unwrap_or_else(|| now.date_naive()),
            expiry_date: input.expiry_date,
        };
        purchase::insert(&mut tx, &record).await?;

        let new_stock = drug::increment_stock(&mut tx, &record.drug_id, record.quantity_purchased)
            .await?
            .ok_or_else(|| CoreError::DrugNotFound(record.drug_id.clone()))?;
        let updated_drug = drug::require(&mut tx, &record.drug_id).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        let receipt = PurchaseReceipt {
            total_cost: record.total_cost(),
            previous_stock: new_stock - record.quantity_purchased,
            new_stock,
            supplier_created: supplier.was_created(),
            drug_created: drug.was_created(),
            supplier: supplier.into_inner(),
            drug: updated_drug,
            purchase: record,
        };

        info!(
            purchase_id = %receipt.purchase.id,
            drug = %receipt.drug.name,
            supplier = %receipt.supplier.name,
            new_stock = receipt.new_stock,
            total_cost = %receipt.total_cost,
            "Purchase recorded"
        );

        Ok(receipt)
    }

    /// Records a sale of an existing drug.
    ///
    /// ## Errors
    /// - `Domain(Access(Forbidden))` if `grant` is not for `RecordSale`
    /// - `Domain(Validation(..))` for a non-positive quantity or bad id
    /// - `Domain(DrugNotFound)` for an unknown drug
    /// - `Domain(InsufficientStock)` when the quantity exceeds stock, including
    ///   when a concurrent sale took it first
    pub async fn record_sale(&self, grant: &Grant<'_>, input: &SaleInput) -> DbResult<SaleReceipt> {
        let user = grant.require(Action::RecordSale)?;
        validate_sale_input(input)?;

        debug!(
            user_id = %user.id,
            drug_id = %input.drug_id,
            quantity = input.quantity_sold,
            "Recording sale"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let Some(after) = drug::decrement_stock(&mut tx, &input.drug_id, input.quantity_sold).await?
        else {
            let err = match drug::find_by_id(&mut tx, &input.drug_id).await? {
                None => CoreError::DrugNotFound(input.drug_id.clone()),
                Some(d) => CoreError::InsufficientStock {
                    drug: d.name,
                    available: d.stock_quantity,
                    requested: input.quantity_sold,
                },
            };
            debug!(error = %err, "Sale rejected");
            return Err(err.into());
        };

        let total = Money::from_minor(after.price)
            .checked_multiply_quantity(input.quantity_sold)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "quantity_sold".to_string(),
                min: 1,
                max: i64::MAX / after.price.max(1),
            })?;

        let record = Sale {
            id: new_id(),
            drug_id: input.drug_id.clone(),
            quantity_sold: input.quantity_sold,
            total_price: total.minor(),
            sold_by: user.id.clone(),
            date_sold: Utc::now(),
        };
        sale::insert(&mut tx, &record).await?;
        let updated_drug = drug::require(&mut tx, &record.drug_id).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            sale_id = %record.id,
            drug = %updated_drug.name,
            quantity = record.quantity_sold,
            total = %total,
            new_stock = after.stock_quantity,
            "Sale recorded"
        );

        Ok(SaleReceipt {
            previous_stock: after.stock_quantity + record.quantity_sold,
            new_stock: after.stock_quantity,
            drug: updated_drug,
            sale: record,
        })
    }

    /// Adds a drug through the catalog form.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the name exists ignoring case
    /// - `Domain(SupplierNotFound)` for an unknown supplier id
    pub async fn add_drug(&self, grant: &Grant<'_>, input: &NewDrug) -> DbResult<Drug> {
        let user = grant.require(Action::ManageCatalog)?;
        validate_new_drug(input)?;

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        if let Some(supplier_id) = &input.supplier_id {
            supplier::find_by_id(&mut tx, supplier_id)
                .await?
                .ok_or_else(|| CoreError::SupplierNotFound(supplier_id.clone()))?;
        }

        let now = Utc::now();
        let candidate = Drug {
            id: new_id(),
            name: input.name.trim().to_string(),
            category: input.category.clone(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            price: input.price,
            stock_quantity: input.stock_quantity,
            expiry_date: input.expiry_date,
            supplier_id: input.supplier_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let stored = drug::insert_if_absent(&mut tx, &candidate)
            .await?
            .ok_or_else(|| DbError::duplicate("drug", &candidate.name))?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(drug_id = %stored.id, name = %stored.name, user_id = %user.id, "Drug added to catalog");
        Ok(stored)
    }

    /// Adds a supplier explicitly.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the name exists ignoring case
    pub async fn add_supplier(&self, grant: &Grant<'_>, name: &str) -> DbResult<Supplier> {
        let user = grant.require(Action::ManageSuppliers)?;
        validate_name("name", name)?;

        let mut conn = self.pool.acquire().await?;
        let stored = supplier::insert(&mut conn, name).await?;

        info!(supplier_id = %stored.id, name = %stored.name, user_id = %user.id, "Supplier added");
        Ok(stored)
    }
}

// =============================================================================
// Reference resolution
// =============================================================================

/// Inserting before looking up makes the first statement of the
/// transaction a write, so SQLite hands us the write lock up front.
async fn resolve_supplier(
    conn: &mut SqliteConnection,
    reference: &CatalogRef,
) -> DbResult<FindOrCreate<Supplier>> {
    match reference {
        CatalogRef::Id(id) => supplier::find_by_id(conn, id)
            .await?
            .map(FindOrCreate::Found)
            .ok_or_else(|| CoreError::SupplierNotFound(id.clone()).into()),
        CatalogRef::Name(name) => {
            if let Some(created) = supplier::insert_if_absent(conn, name).await? {
                debug!(supplier_id = %created.id, name = %created.name, "Created supplier");
                return Ok(FindOrCreate::Created(created));
            }
            supplier::find_by_name(conn, name)
                .await?
                .map(FindOrCreate::Found)
                .ok_or_else(|| DbError::Internal(format!("supplier '{name}' vanished mid-transaction")))
        }
    }
}

async fn resolve_drug(
    conn: &mut SqliteConnection,
    input: &PurchaseInput,
    supplier: &Supplier,
) -> DbResult<FindOrCreate<Drug>> {
    match &input.drug {
        CatalogRef::Id(id) => drug::find_by_id(conn, id)
            .await?
            .map(FindOrCreate::Found)
            .ok_or_else(|| CoreError::DrugNotFound(id.clone()).into()),
        CatalogRef::Name(name) => {
            let now = Utc::now();
            let candidate = Drug {
                id: new_id(),
                name: name.trim().to_string(),
                category: DEFAULT_DRUG_CATEGORY.to_string(),
                description: Some(AUTO_ADDED_DESCRIPTION.to_string()),
                price: input.unit_cost,
                stock_quantity: 0,
                expiry_date: input.expiry_date,
                supplier_id: Some(supplier.id.clone()),
                created_at: now,
                updated_at: now,
            };

            if let Some(created) = drug::insert_if_absent(conn, &candidate).await? {
                debug!(drug_id = %created.id, name = %created.name, "Created drug");
                return Ok(FindOrCreate::Created(created));
            }
            drug::find_by_name(conn, name)
                .await?
                .map(FindOrCreate::Found)
                .ok_or_else(|| DbError::Internal(format!("drug '{name}' vanished mid-transaction")))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file_db, insert_user, test_db};
    use crate::Database;
    use pharmacy_core::access::{authorize, AccessError, Session};
    use pharmacy_core::summary::DateRange;
    use pharmacy_core::Role;

    async fn session(db: &Database, role: Role) -> Session {
        Session::authenticated(insert_user(db, role).await)
    }

    fn buy(drug: &str, supplier: &str, qty: i64, cost: i64) -> PurchaseInput {
        PurchaseInput {
            drug: CatalogRef::Name(drug.to_string()),
            supplier: CatalogRef::Name(supplier.to_string()),
            quantity_purchased: qty,
            unit_cost: cost,
            date_purchased: None,
            expiry_date: None,
        }
    }

    /// Catalog "Paracetamol" at price 500 with stock 100.
    async fn stock_paracetamol(db: &Database) -> Drug {
        let pharmacist = session(db, Role::Pharmacist).await;
        let grant = authorize(&pharmacist, Action::ManageCatalog).unwrap();
        db.inventory()
            .add_drug(
                &grant,
                &NewDrug {
                    name: "Paracetamol".to_string(),
                    category: "Pain Relief".to_string(),
                    description: None,
                    price: 500,
                    stock_quantity: 100,
                    expiry_date: None,
                    supplier_id: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sale_then_purchase_scenario() {
        let db = test_db().await;
        let paracetamol = stock_paracetamol(&db).await;

        let cashier = session(&db, Role::Cashier).await;
        let grant = authorize(&cashier, Action::RecordSale).unwrap();
        let sold = db
            .inventory()
            .record_sale(
                &grant,
                &SaleInput {
                    drug_id: paracetamol.id.clone(),
                    quantity_sold: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(sold.sale.total_price, 5000);
        assert_eq!(sold.previous_stock, 100);
        assert_eq!(sold.new_stock, 90);
        assert_eq!(sold.sale.sold_by, cashier.user().unwrap().id);

        let procurement = session(&db, Role::Procurement).await;
        let grant = authorize(&procurement, Action::RecordPurchase).unwrap();
        let bought = db
            .inventory()
            .record_purchase(&grant, &buy("Paracetamol", "Acme Ltd", 50, 300))
            .await
            .unwrap();
        assert!(bought.supplier_created);
        assert!(!bought.drug_created);
        assert_eq!(bought.drug.id, paracetamol.id);
        assert_eq!(bought.previous_stock, 90);
        assert_eq!(bought.new_stock, 140);
        assert_eq!(bought.drug.stock_quantity, 140);
        assert_eq!(bought.total_cost.minor(), 15_000);
        assert_eq!(bought.purchase.entered_by, procurement.user().unwrap().id);
        assert_eq!(bought.purchase.date_purchased, bought.purchase.created_at.date_naive());
    }

    #[tokio::test]
    async fn test_purchase_creates_missing_drug_with_defaults() {
        let db = test_db().await;
        let admin = session(&db, Role::Admin).await;
        let grant = authorize(&admin, Action::RecordPurchase).unwrap();

        let mut input = buy("  Cetirizine 10mg ", "Medipark", 20, 250);
        input.expiry_date = chrono::NaiveDate::from_ymd_opt(2027, 3, 31);
        let receipt = db.inventory().record_purchase(&grant, &input).await.unwrap();

        assert!(receipt.drug_created);
        assert!(receipt.supplier_created);
        let drug = &receipt.drug;
        assert_eq!(drug.name, "Cetirizine 10mg");
        assert_eq!(drug.category, DEFAULT_DRUG_CATEGORY);
        assert_eq!(drug.description.as_deref(), Some(AUTO_ADDED_DESCRIPTION));
        assert_eq!(drug.price, 250);
        assert_eq!(drug.stock_quantity, 20);
        assert_eq!(drug.expiry_date, input.expiry_date);
        assert_eq!(drug.supplier_id.as_deref(), Some(receipt.supplier.id.as_str()));
        assert_eq!(receipt.previous_stock, 0);
    }

    #[tokio::test]
    async fn test_name_resolution_never_duplicates() {
        let db = test_db().await;
        let admin = session(&db, Role::Admin).await;
        let grant = authorize(&admin, Action::RecordPurchase).unwrap();

        let first = db
            .inventory()
            .record_purchase(&grant, &buy("Amoxicillin", "Acme Ltd", 10, 100))
            .await
            .unwrap();
        let second = db
            .inventory()
            .record_purchase(&grant, &buy("AMOXICILLIN", "acme ltd", 5, 120))
            .await
            .unwrap();

        assert!(!second.supplier_created);
        assert!(!second.drug_created);
        assert_eq!(second.supplier.id, first.supplier.id);
        assert_eq!(second.drug.id, first.drug.id);
        assert_eq!(second.new_stock, 15);
        // Existing drugs keep their price; purchases don't reprice.
        assert_eq!(second.drug.price, 100);

        assert_eq!(db.suppliers().count().await.unwrap(), 1);
        assert_eq!(db.drugs().count().await.unwrap(), 1);
        assert_eq!(db.purchases().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purchase_by_id() {
        let db = test_db().await;
        let paracetamol = stock_paracetamol(&db).await;
        let admin = session(&db, Role::Admin).await;

        let supplier = {
            let grant = authorize(&admin, Action::ManageSuppliers).unwrap();
            db.inventory().add_supplier(&grant, "Acme Ltd").await.unwrap()
        };

        let grant = authorize(&admin, Action::RecordPurchase).unwrap();
        let input = PurchaseInput {
            drug: CatalogRef::Id(paracetamol.id.clone()),
            supplier: CatalogRef::Id(supplier.id.clone()),
            quantity_purchased: 7,
            unit_cost: 0,
            date_purchased: chrono::NaiveDate::from_ymd_opt(2026, 9, 30),
            expiry_date: None,
        };
        let receipt = db.inventory().record_purchase(&grant, &input).await.unwrap();

        assert_eq!(receipt.new_stock, 107);
        assert!(receipt.total_cost.is_zero());
        assert_eq!(receipt.purchase.date_purchased, input.date_purchased.unwrap());
    }

    #[tokio::test]
    async fn test_failed_purchase_leaves_nothing_behind() {
        let db = test_db().await;
        let admin = session(&db, Role::Admin).await;
        let grant = authorize(&admin, Action::RecordPurchase).unwrap();

        // Supplier would be created, then the drug id turns out unknown.
        let input = PurchaseInput {
            drug: CatalogRef::Id(new_id()),
            supplier: CatalogRef::Name("Brand New Supplier".to_string()),
            quantity_purchased: 5,
            unit_cost: 100,
            date_purchased: None,
            expiry_date: None,
        };
        let err = db.inventory().record_purchase(&grant, &input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DrugNotFound(_))));

        assert_eq!(db.suppliers().count().await.unwrap(), 0);
        assert_eq!(db.purchases().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_purchase_is_rejected_before_writing() {
        let db = test_db().await;
        let admin = session(&db, Role::Admin).await;
        let grant = authorize(&admin, Action::RecordPurchase).unwrap();

        let err = db
            .inventory()
            .record_purchase(&grant, &buy("Insulin", "Acme Ltd", 0, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(db.suppliers().count().await.unwrap(), 0);
        assert_eq!(db.drugs().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_grant_has_no_side_effects() {
        let db = test_db().await;
        let paracetamol = stock_paracetamol(&db).await;
        let cashier = session(&db, Role::Cashier).await;

        // A cashier may sell, but that grant cannot be used to purchase.
        let grant = authorize(&cashier, Action::RecordSale).unwrap();
        let err = db
            .inventory()
            .record_purchase(&grant, &buy("Paracetamol", "Acme Ltd", 5, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Access(AccessError::Forbidden { .. }))
        ));

        let err = db
            .inventory()
            .add_supplier(&grant, "Acme Ltd")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Access(_))));

        assert_eq!(db.suppliers().count().await.unwrap(), 0);
        assert_eq!(db.purchases().count().await.unwrap(), 0);
        let unchanged = db.drugs().get_by_id(&paracetamol.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, 100);
    }

    #[tokio::test]
    async fn test_sale_cannot_exceed_stock() {
        let db = test_db().await;
        let paracetamol = stock_paracetamol(&db).await;
        let cashier = session(&db, Role::Cashier).await;
        let grant = authorize(&cashier, Action::RecordSale).unwrap();

        let err = db
            .inventory()
            .record_sale(
                &grant,
                &SaleInput {
                    drug_id: paracetamol.id.clone(),
                    quantity_sold: 101,
                },
            )
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                drug,
                available,
                requested,
            }) => {
                assert_eq!(drug, "Paracetamol");
                assert_eq!(available, 100);
                assert_eq!(requested, 101);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(db.sales().count().await.unwrap(), 0);

        // Selling exactly what's on hand is fine and empties the shelf.
        let receipt = db
            .inventory()
            .record_sale(
                &grant,
                &SaleInput {
                    drug_id: paracetamol.id.clone(),
                    quantity_sold: 100,
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, 0);
    }

    #[tokio::test]
    async fn test_sale_of_unknown_drug() {
        let db = test_db().await;
        let cashier = session(&db, Role::Cashier).await;
        let grant = authorize(&cashier, Action::RecordSale).unwrap();

        let err = db
            .inventory()
            .record_sale(
                &grant,
                &SaleInput {
                    drug_id: new_id(),
                    quantity_sold: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DrugNotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_cannot_oversell() {
        let (_dir, db) = file_db(8).await;
        let paracetamol = stock_paracetamol(&db).await;
        let cashier = session(&db, Role::Cashier).await;

        // Ten tills each try to sell 15 of the 100 in stock at once.
        let tills: Vec<_> = (0..10)
            .map(|_| {
                let db = db.clone();
                let cashier = cashier.clone();
                let input = SaleInput {
                    drug_id: paracetamol.id.clone(),
                    quantity_sold: 15,
                };
                tokio::spawn(async move {
                    let grant = authorize(&cashier, Action::RecordSale).unwrap();
                    db.inventory().record_sale(&grant, &input).await
                })
            })
            .collect();

        let mut sold = 0;
        let mut refused = 0;
        for till in tills {
            match till.await.unwrap() {
                Ok(_) => sold += 1,
                Err(DbError::Domain(CoreError::InsufficientStock { available, requested, .. })) => {
                    assert!(available < requested);
                    refused += 1;
                }
                Err(other) => panic!("unexpected sale error: {other}"),
            }
        }
        assert_eq!(sold, 6);
        assert_eq!(refused, 4);

        let drug = db.drugs().get_by_id(&paracetamol.id).await.unwrap().unwrap();
        assert_eq!(drug.stock_quantity, 10);
        assert_eq!(db.sales().list(DateRange::default()).await.unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_two_concurrent_sales_of_sixty() {
        let (_dir, db) = file_db(4).await;
        let paracetamol = stock_paracetamol(&db).await;
        let cashier = session(&db, Role::Cashier).await;
        let grant = authorize(&cashier, Action::RecordSale).unwrap();
        let input = SaleInput {
            drug_id: paracetamol.id.clone(),
            quantity_sold: 60,
        };

        let first = db.inventory();
        let second = db.inventory();
        let (a, b) = tokio::join!(
            first.record_sale(&grant, &input),
            second.record_sale(&grant, &input)
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DbError::Domain(CoreError::InsufficientStock { available: 40, .. }))
        )));

        let drug = db.drugs().get_by_id(&paracetamol.id).await.unwrap().unwrap();
        assert_eq!(drug.stock_quantity, 40);
    }

    #[tokio::test]
    async fn test_sale_uses_current_price() {
        let db = test_db().await;
        let paracetamol = stock_paracetamol(&db).await;
        sqlx::query("UPDATE drugs SET price = 650 WHERE id = ?1")
            .bind(&paracetamol.id)
            .execute(db.pool())
            .await
            .unwrap();

        let cashier = session(&db, Role::Cashier).await;
        let grant = authorize(&cashier, Action::RecordSale).unwrap();
        let receipt = db
            .inventory()
            .record_sale(
                &grant,
                &SaleInput {
                    drug_id: paracetamol.id.clone(),
                    quantity_sold: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.sale.total_price, 1300);
    }

    #[tokio::test]
    async fn test_add_drug_rejects_duplicates_and_unknown_supplier() {
        let db = test_db().await;
        stock_paracetamol(&db).await;
        let pharmacist = session(&db, Role::Pharmacist).await;
        let grant = authorize(&pharmacist, Action::ManageCatalog).unwrap();

        let dup = NewDrug {
            name: "PARACETAMOL".to_string(),
            category: "Other".to_string(),
            description: None,
            price: 1,
            stock_quantity: 0,
            expiry_date: None,
            supplier_id: None,
        };
        let err = db.inventory().add_drug(&grant, &dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let orphan = NewDrug {
            name: "Metformin".to_string(),
            supplier_id: Some(new_id()),
            ..dup
        };
        let err = db.inventory().add_drug(&grant, &orphan).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SupplierNotFound(_))));
        assert_eq!(db.drugs().count().await.unwrap(), 1);
    }

    #[test]
    fn test_find_or_create_accessors() {
        let found = FindOrCreate::Found(1);
        let created = FindOrCreate::Created(2);
        assert!(!found.was_created());
        assert!(created.was_created());
        assert_eq!(*found.get(), 1);
        assert_eq!(created.into_inner(), 2);
    }
}
