//! In-process store for exercising the loader without a database.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use storefront::{Customer, EntityKind, NewCustomer, Order, Product, StoreError};

use super::store::DataStore;

#[derive(Debug)]
struct Tables {
    customers: Vec<Customer>,
    orders: Vec<Order>,
    products: Vec<Product>,
    next_customer_id: i64,
    next_order_id: i64,
    next_product_id: i64,
    insert_calls: usize,
    committed_batches: Vec<usize>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            customers: Vec::new(),
            orders: Vec::new(),
            products: Vec::new(),
            next_customer_id: 1,
            next_order_id: 1,
            next_product_id: 1,
            insert_calls: 0,
            committed_batches: Vec::new(),
        }
    }
}

/// A [`DataStore`] that keeps rows in memory and can be told to fail.
///
/// Batches are applied all-or-nothing under a single lock, and ids come from
/// per-table counters starting at 1, mirroring the Postgres identity columns.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_on_batch: Option<usize>,
    unreachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the `batch`-th call to `insert_batch` (1-based) without storing any of it.
    pub fn fail_on_batch(mut self, batch: usize) -> Self {
        self.fail_on_batch = Some(batch);
        self
    }

    /// Fails every operation as if the server could not be reached.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.lock().customers.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Sizes of the batches that committed, in commit order.
    pub fn committed_batches(&self) -> Vec<usize> {
        self.lock().committed_batches.clone()
    }

    /// Number of `insert_batch` calls received, including rejected ones.
    pub fn insert_calls(&self) -> usize {
        self.lock().insert_calls
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pool acquisition timing out is how sqlx reports a server it cannot reach.
    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Unreachable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn exists(&self, kind: EntityKind) -> Result<bool, StoreError> {
        Ok(self.count(kind).await? > 0)
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        self.check_reachable()?;

        let tables = self.lock();
        let count = match kind {
            EntityKind::Customer => tables.customers.len(),
            EntityKind::Order => tables.orders.len(),
            EntityKind::Product => tables.products.len(),
        };
        Ok(count as u64)
    }

    async fn insert_batch(&self, customers: &[NewCustomer]) -> Result<(), StoreError> {
        self.check_reachable()?;

        let mut tables = self.lock();
        tables.insert_calls += 1;
        let call = tables.insert_calls;
        if self.fail_on_batch == Some(call) {
            return Err(StoreError::BatchRejected {
                batch: call,
                reason: "injected failure".to_string(),
            });
        }

        let mut new_customers = Vec::with_capacity(customers.len());
        let mut new_orders = Vec::new();
        let mut new_products = Vec::new();
        let (mut customer_id, mut order_id, mut product_id) = (
            tables.next_customer_id,
            tables.next_order_id,
            tables.next_product_id,
        );

        for customer in customers {
            new_customers.push(Customer {
                id: customer_id,
                name: customer.name.clone(),
                age: customer.age,
                balance: customer.balance,
                status: customer.status.as_str().to_string(),
                gender: customer.gender.as_str().to_string(),
                address: customer.address.clone(),
                city: customer.city.clone(),
                country: customer.country.clone(),
                region: customer.region.clone(),
                postal_code: customer.postal_code.clone(),
                country_code: customer.country_code.clone(),
                phone: customer.phone.clone(),
                fax: customer.fax.clone(),
                fax_number: customer.fax_number.clone(),
                email: customer.email.clone(),
            });

            for order in &customer.orders {
                new_orders.push(Order {
                    id: order_id,
                    order_date: order.order_date,
                    customer_id,
                });

                for product in &order.products {
                    new_products.push(Product {
                        id: product_id,
                        name: product.name.clone(),
                        price: product.price,
                        order_id,
                    });
                    product_id += 1;
                }
                order_id += 1;
            }
            customer_id += 1;
        }

        tables.customers.append(&mut new_customers);
        tables.orders.append(&mut new_orders);
        tables.products.append(&mut new_products);
        tables.next_customer_id = customer_id;
        tables.next_order_id = order_id;
        tables.next_product_id = product_id;
        tables.committed_batches.push(customers.len());

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check_reachable()?;

        let mut tables = self.lock();
        let insert_calls = tables.insert_calls;
        let committed_batches = std::mem::take(&mut tables.committed_batches);
        *tables = Tables {
            insert_calls,
            committed_batches,
            ..Tables::default()
        };

        Ok(())
    }
}
