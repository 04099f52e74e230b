use async_trait::async_trait;

use storefront::{Database, EntityKind, NewCustomer, StoreError};

/// Persistence boundary used by the seed loader.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Returns whether at least one record of `kind` exists.
    async fn exists(&self, kind: EntityKind) -> Result<bool, StoreError>;

    /// Returns the number of `kind` records; the exact-count guard compares it
    /// with the requested count.
    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError>;

    /// Durably stores `customers` and everything they own as one unit,
    /// assigning ids to every new row.
    async fn insert_batch(&self, customers: &[NewCustomer]) -> Result<(), StoreError>;

    /// Removes every customer, order and product.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl DataStore for Database {
    async fn exists(&self, kind: EntityKind) -> Result<bool, StoreError> {
        Database::exists(self, kind).await
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        Database::count(self, kind).await
    }

    async fn insert_batch(&self, customers: &[NewCustomer]) -> Result<(), StoreError> {
        self.insert_customer_batch(customers).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clear_all().await
    }
}
