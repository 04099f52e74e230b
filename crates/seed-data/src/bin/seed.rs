//! Seeds the storefront database with customers, orders and products.
//!
//! Run with:
//! ```
//! DATABASE_URL=postgres://... cargo run -p seed-data --bin seed
//! ```
//!
//! `SEED_CUSTOMER_COUNT`, `SEED_BATCH_SIZE`, `SEED_GUARD` (`any`, `exact`, `force`)
//! and `SEED_MAX_CONNECTIONS` override the defaults.

use seed_data::config::SeedConfig;
use seed_data::db::SeedLoader;
use storefront::{Database, EntityKind};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SeedConfig::from_env()?;

    let db = Database::connect(&config.database_url, config.max_connections).await?;
    tracing::info!("Connected to database");

    db.migrate().await?;

    SeedLoader::from_config(&config)
        .populate(&db, config.customer_count)
        .await?;

    // Summary output
    tracing::info!("Store contents:");
    for kind in EntityKind::ALL {
        tracing::info!("  {}: {}", kind.table_name(), db.count(kind).await?);
    }

    Ok(())
}
