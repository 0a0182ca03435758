//! # Founder Bootstrap
//!
//! Creates the single founder account. Run once when a pharmacy is set up;
//! running it again changes nothing.
//!
//! ## Usage
//! ```bash
//! DATABASE_URL=sqlite://dawa.db \
//! FOUNDER_NAME="Jane Akello" \
//! FOUNDER_EMAIL=jane@pharmacy.ug \
//! FOUNDER_PASSWORD='...' \
//!   cargo run -p pharmacy-api --bin provision-founder
//! ```

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pharmacy_api::auth::hash_password;
use pharmacy_api::config::ConfigError;
use pharmacy_core::validation::validate_password;
use pharmacy_db::{Database, DbConfig, FindOrCreate};

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url = required("DATABASE_URL")?;
    let name = required("FOUNDER_NAME")?;
    let email = required("FOUNDER_EMAIL")?;
    let password = required("FOUNDER_PASSWORD")?;

    validate_password(&password)?;
    let password_hash = hash_password(&password).await?;

    let db = Database::new(DbConfig::from_url(&database_url)).await?;
    let outcome = db
        .accounts()
        .provision_founder(&name, &email, &password_hash)
        .await;
    db.close().await;

    match outcome? {
        FindOrCreate::Created(founder) => {
            info!(user_id = %founder.id, email = %founder.email, "Founder account created");
        }
        FindOrCreate::Found(existing) => {
            info!(
                user_id = %existing.id,
                email = %existing.email,
                "A founder already exists, nothing to do"
            );
        }
    }

    Ok(())
}
