//! # Demo Catalog Seeder
//!
//! Fills an empty database with suppliers and drugs for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./dawa_dev.db
//! cargo run -p pharmacy-db --bin seed
//!
//! # Specify database path
//! cargo run -p pharmacy-db --bin seed -- --db ./data/dawa.db
//! ```
//!
//! Every drug gets a supplier, a price in UGX, an opening stock level and
//! an expiry date. A few are deliberately out of stock or close to expiry so
//! the dashboard counters have something to show.

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pharmacy_core::{Drug, Money};
use pharmacy_db::{new_id, Database, DbConfig};

const SUPPLIERS: &[&str] = &[
    "Acme Pharmaceuticals Ltd",
    "Medipark Distributors",
    "Kampala Health Supplies",
];

/// (category, [(name, price, stock)])
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Pain Relief",
        &[
            ("Paracetamol 500mg", 500, 400),
            ("Ibuprofen 400mg", 800, 250),
            ("Diclofenac 50mg", 1_000, 120),
            ("Aspirin 300mg", 300, 0),
        ],
    ),
    (
        "Antibiotic",
        &[
            ("Amoxicillin 500mg", 1_500, 180),
            ("Ciprofloxacin 500mg", 2_000, 90),
            ("Metronidazole 400mg", 700, 150),
            ("Doxycycline 100mg", 1_200, 60),
        ],
    ),
    (
        "Antihistamine",
        &[
            ("Cetirizine 10mg", 400, 200),
            ("Loratadine 10mg", 600, 75),
            ("Chlorpheniramine 4mg", 200, 300),
        ],
    ),
    (
        "Diabetes",
        &[
            ("Metformin 500mg", 900, 140),
            ("Glibenclamide 5mg", 700, 40),
            ("Insulin Mixtard 10ml", 25_000, 12),
        ],
    ),
    (
        "Other",
        &[
            ("ORS Sachet", 500, 500),
            ("Zinc Sulphate 20mg", 300, 0),
            ("Folic Acid 5mg", 200, 220),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./dawa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dawa POS Demo Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./dawa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(database = %db_path, "Seeding demo catalog");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.drugs().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has drugs, skipping seed");
        return Ok(());
    }

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for name in SUPPLIERS {
        let supplier = match db.suppliers().find_by_name(name).await? {
            Some(s) => s,
            None => db.suppliers().create(name).await?,
        };
        supplier_ids.push(supplier.id);
    }

    let today = Utc::now().date_naive();
    let now = Utc::now();
    let mut created = 0usize;
    let mut stock_value = Money::zero();

    for (category_idx, (category, drugs)) in CATALOG.iter().enumerate() {
        for (drug_idx, (name, price, stock)) in drugs.iter().enumerate() {
            let seed = category_idx * 10 + drug_idx;

            // Every seventh drug expires within the dashboard warning window.
            let expiry = if seed % 7 == 0 {
                today + Duration::days(14)
            } else {
                today + Duration::days(180 + (seed as i64 * 37) % 540)
            };

            let drug = Drug {
                id: new_id(),
                name: name.to_string(),
                category: category.to_string(),
                description: None,
                price: *price,
                stock_quantity: *stock,
                expiry_date: Some(expiry),
                supplier_id: Some(supplier_ids[seed % supplier_ids.len()].clone()),
                created_at: now,
                updated_at: now,
            };

            match db.drugs().create(&drug).await {
                Ok(Some(stored)) => {
                    stock_value += stored.price().multiply_quantity(stored.stock_quantity);
                    created += 1;
                }
                Ok(None) => warn!(name = %drug.name, "Drug already exists"),
                Err(e) => warn!(name = %drug.name, error = %e, "Failed to insert drug"),
            }
        }
    }

    let overview = db.drugs().overview(today, pharmacy_core::EXPIRY_WARNING_DAYS).await?;
    info!(
        drugs = created,
        suppliers = supplier_ids.len(),
        stock_value = %stock_value,
        out_of_stock = overview.out_of_stock,
        expiring_soon = overview.expiring_soon,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
