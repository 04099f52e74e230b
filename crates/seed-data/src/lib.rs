//! Seed data for the storefront benchmarks.
//!
//! This crate generates customers, each owning one order of two products, and
//! writes them to a store in fixed-size atomic batches behind an idempotency
//! guard, so repeated benchmark runs only pay for seeding once.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let db = Database::connect(&config.database_url, config.max_connections).await?;
//! db.migrate().await?;
//!
//! SeedLoader::from_config(&config)
//!     .populate(&db, config.customer_count)
//!     .await?;
//! ```

pub mod config;
pub mod db;
pub mod generators;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{GuardMode, SeedConfig};
    pub use crate::db::{DataStore, MemoryStore, SeedError, SeedLoader};
    pub use crate::generators::CustomerGenerator;
    pub use storefront::{Database, EntityKind};
}
