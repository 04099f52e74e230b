//! Store integration for seeding.
//!
//! The [`SeedLoader`] writes generated customers through the [`DataStore`]
//! boundary, which is implemented for the Postgres [`storefront::Database`]
//! and for the in-process [`MemoryStore`].

mod loader;
mod memory;
mod store;

pub use loader::{ProgressCallback, SeedError, SeedLoader};
pub use memory::MemoryStore;
pub use store::DataStore;
