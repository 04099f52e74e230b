//! Query workloads compared by the benchmark runner.
//!
//! Each workload answers the same question two ways (or measures one set-based
//! write). Every statement opens with a comment naming its workload so the
//! query can be picked out of the server log.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::BenchConfig;
use crate::database::Database;
use crate::errors::StoreError;
use crate::models::{
    Customer, CustomerWithOrders, Order, OrderWithCustomer, OrderWithProducts, Product,
};
use crate::pagination::{KeysetPage, Page, PaginationQuery};

/// One row of the customer/order/product outer join.
#[derive(Debug, Clone, FromRow)]
pub struct JoinedRow {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub order_id: Option<i64>,
    pub order_date: Option<OffsetDateTime>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Clone)]
pub struct QueryStrategies {
    db: Database,
    config: BenchConfig,
}

impl QueryStrategies {
    pub fn new(db: Database) -> Self {
        Self::with_config(db, BenchConfig::default())
    }

    pub fn with_config(db: Database, config: BenchConfig) -> Self {
        Self { db, config }
    }

    pub async fn fetch_customers_read_only(&self) -> Result<Vec<Customer>, StoreError> {
        let customers = sqlx::query_as(
            r#"
            /* fetch_customers_read_only */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            LIMIT $1
            "#,
        )
        .bind(self.config.take)
        .fetch_all(self.db.pool())
        .await?;

        Ok(customers)
    }

    /// Loads the same rows as [`Self::fetch_customers_read_only`], locking them for update
    /// for the lifetime of a transaction.
    pub async fn fetch_customers_for_update(&self) -> Result<Vec<Customer>, StoreError> {
        let mut tx = self.db.pool().begin().await?;

        let customers = sqlx::query_as(
            r#"
            /* fetch_customers_for_update */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            LIMIT $1
            FOR UPDATE
            "#,
        )
        .bind(self.config.take)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(customers)
    }

    async fn fetch_all_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let customers = sqlx::query_as(
            r#"
            /* fetch_all_customers */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(customers)
    }

    /// Counts customers by materializing every row.
    pub async fn count_customers_client_side(&self) -> Result<u64, StoreError> {
        let customers = self.fetch_all_customers().await?;
        Ok(customers.len() as u64)
    }

    pub async fn count_customers_server_side(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            /* count_customers_server_side */
            SELECT COUNT(*) FROM customers
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Checks for the probe customer by scanning every row in memory.
    pub async fn customer_exists_client_side(&self) -> Result<bool, StoreError> {
        let customers = self.fetch_all_customers().await?;
        Ok(customers.iter().any(|c| c.id == self.config.probe_id))
    }

    pub async fn customer_exists_server_side(&self) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            /* customer_exists_server_side */
            SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)
            "#,
        )
        .bind(self.config.probe_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    /// Loads every customer, then writes the new name back one row at a time
    /// inside a single transaction. Returns the number of rows written.
    pub async fn rename_customers_per_row(&self, new_name: &str) -> Result<u64, StoreError> {
        let customers = self.fetch_all_customers().await?;

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;
        for customer in &customers {
            let result = sqlx::query(
                r#"
                /* rename_customers_per_row */
                UPDATE customers SET name = $1 WHERE id = $2
                "#,
            )
            .bind(new_name)
            .bind(customer.id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;

        debug!(updated, "Renamed customers row by row");
        Ok(updated)
    }

    pub async fn rename_customers_set_based(&self, new_name: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            /* rename_customers_set_based */
            UPDATE customers SET name = $1
            "#,
        )
        .bind(new_name)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one customer; its orders and products go with it through the
    /// foreign-key cascade. Returns the number of customers removed.
    pub async fn delete_customer(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            /* delete_customer */
            DELETE FROM customers WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_probe_customer(&self) -> Result<u64, StoreError> {
        self.delete_customer(self.config.probe_id).await
    }

    /// Loads customer trees with a single outer join.
    pub async fn eager_load_joined(&self) -> Result<Vec<CustomerWithOrders>, StoreError> {
        let rows: Vec<JoinedRow> = sqlx::query_as(
            r#"
            /* eager_load_joined */
            SELECT c.id, c.name, c.age, c.balance, c.status, c.gender, c.address, c.city,
                   c.country, c.region, c.postal_code, c.country_code, c.phone, c.fax,
                   c.fax_number, c.email,
                   o.id AS order_id, o.order_date,
                   p.id AS product_id, p.name AS product_name, p.price
            FROM (SELECT * FROM customers ORDER BY id LIMIT $1) c
            LEFT JOIN orders o ON o.customer_id = c.id
            LEFT JOIN products p ON p.order_id = o.id
            ORDER BY c.id, o.id, p.id
            "#,
        )
        .bind(self.config.take)
        .fetch_all(self.db.pool())
        .await?;

        Ok(assemble_joined(rows))
    }

    /// Loads customer trees with one query per level, stitched together in memory.
    pub async fn eager_load_split(&self) -> Result<Vec<CustomerWithOrders>, StoreError> {
        let customers: Vec<Customer> = sqlx::query_as(
            r#"
            /* eager_load_split: customers */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            ORDER BY id
            LIMIT $1
            "#,
        )
        .bind(self.config.take)
        .fetch_all(self.db.pool())
        .await?;

        let customer_ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
        let orders: Vec<Order> = sqlx::query_as(
            r#"
            /* eager_load_split: orders */
            SELECT id, order_date, customer_id
            FROM orders
            WHERE customer_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&customer_ids)
        .fetch_all(self.db.pool())
        .await?;

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let products: Vec<Product> = sqlx::query_as(
            r#"
            /* eager_load_split: products */
            SELECT id, name, price, order_id
            FROM products
            WHERE order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(stitch_trees(customers, orders, products))
    }

    pub async fn orders_with_customer(&self) -> Result<Vec<OrderWithCustomer>, StoreError> {
        let orders = sqlx::query_as(
            r#"
            /* orders_with_customer */
            SELECT o.id, o.order_date, o.customer_id, c.name AS customer_name
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            LIMIT $1
            "#,
        )
        .bind(self.config.take)
        .fetch_all(self.db.pool())
        .await?;

        Ok(orders)
    }

    pub async fn customers_page_offset(
        &self,
        query: PaginationQuery,
    ) -> Result<Page<Customer>, StoreError> {
        let items = sqlx::query_as(
            r#"
            /* customers_page_offset */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(self.db.pool())
        .await?;

        let total_count: i64 = sqlx::query_scalar(
            r#"
            /* customers_page_offset: total */
            SELECT COUNT(*) FROM customers
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(Page::new(items, total_count, query.limit, query.offset))
    }

    /// Fetches the `limit` customers following `after` in id order.
    pub async fn customers_page_keyset(
        &self,
        after: Option<i64>,
        limit: i64,
    ) -> Result<KeysetPage<Customer>, StoreError> {
        let items = sqlx::query_as(
            r#"
            /* customers_page_keyset */
            SELECT id, name, age, balance, status, gender, address, city, country, region,
                   postal_code, country_code, phone, fax, fax_number, email
            FROM customers
            WHERE id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after.unwrap_or(0))
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(KeysetPage::from_rows(items, limit, |c: &Customer| c.id))
    }
}

/// Folds rows ordered by (customer, order, product) into ownership trees.
///
/// Null order or product columns come from the outer join and contribute no child.
pub fn assemble_joined(rows: Vec<JoinedRow>) -> Vec<CustomerWithOrders> {
    let mut trees: Vec<CustomerWithOrders> = Vec::new();

    for row in rows {
        let is_new_customer = trees
            .last()
            .is_none_or(|tree| tree.customer.id != row.customer.id);
        if is_new_customer {
            trees.push(CustomerWithOrders {
                customer: row.customer,
                orders: Vec::new(),
            });
        }
        let Some(tree) = trees.last_mut() else {
            continue;
        };

        let (Some(order_id), Some(order_date)) = (row.order_id, row.order_date) else {
            continue;
        };
        let is_new_order = tree.orders.last().is_none_or(|o| o.order.id != order_id);
        if is_new_order {
            tree.orders.push(OrderWithProducts {
                order: Order {
                    id: order_id,
                    order_date,
                    customer_id: tree.customer.id,
                },
                products: Vec::new(),
            });
        }
        let Some(order) = tree.orders.last_mut() else {
            continue;
        };

        if let (Some(product_id), Some(name), Some(price)) =
            (row.product_id, row.product_name, row.price)
        {
            order.products.push(Product {
                id: product_id,
                name,
                price,
                order_id,
            });
        }
    }

    trees
}

/// Attaches orders and products to their parents by foreign key, keeping the
/// input order of each level.
pub fn stitch_trees(
    customers: Vec<Customer>,
    orders: Vec<Order>,
    products: Vec<Product>,
) -> Vec<CustomerWithOrders> {
    let mut products_by_order: HashMap<i64, Vec<Product>> = HashMap::new();
    for product in products {
        products_by_order
            .entry(product.order_id)
            .or_default()
            .push(product);
    }

    let mut orders_by_customer: HashMap<i64, Vec<OrderWithProducts>> = HashMap::new();
    for order in orders {
        let products = products_by_order.remove(&order.id).unwrap_or_default();
        orders_by_customer
            .entry(order.customer_id)
            .or_default()
            .push(OrderWithProducts { order, products });
    }

    customers
        .into_iter()
        .map(|customer| {
            let orders = orders_by_customer.remove(&customer.id).unwrap_or_default();
            CustomerWithOrders { customer, orders }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i64) -> Customer {
        Customer {
            id,
            name: format!("Customer {id}"),
            age: 30,
            balance: 100,
            status: "Active".to_string(),
            gender: "Male".to_string(),
            address: format!("Address {id}"),
            city: "City 1".to_string(),
            country: "Country 1".to_string(),
            region: "Region 1".to_string(),
            postal_code: "PC1".to_string(),
            country_code: "C1".to_string(),
            phone: "555-0101".to_string(),
            fax: "555-0201".to_string(),
            fax_number: "555-0301".to_string(),
            email: format!("test@customer{id}.com"),
        }
    }

    fn joined(
        customer_id: i64,
        order_id: Option<i64>,
        product: Option<(i64, &str, i64)>,
    ) -> JoinedRow {
        JoinedRow {
            customer: customer(customer_id),
            order_id,
            order_date: order_id.map(|_| OffsetDateTime::UNIX_EPOCH),
            product_id: product.map(|(id, _, _)| id),
            product_name: product.map(|(_, name, _)| name.to_string()),
            price: product.map(|(_, _, price)| Decimal::from(price)),
        }
    }

    #[test]
    fn test_assemble_joined_groups_by_parent() {
        let rows = vec![
            joined(1, Some(10), Some((100, "Product A", 20))),
            joined(1, Some(10), Some((101, "Product B", 30))),
            joined(2, Some(11), Some((102, "Product A", 40))),
            joined(2, Some(11), Some((103, "Product B", 50))),
        ];

        let trees = assemble_joined(rows);

        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].customer.id, 1);
        assert_eq!(trees[0].orders.len(), 1);
        assert_eq!(trees[0].orders[0].order.customer_id, 1);
        assert_eq!(trees[0].orders[0].products.len(), 2);
        assert!(trees[1].orders[0].products.iter().all(|p| p.order_id == 11));
    }

    #[test]
    fn test_assemble_joined_keeps_childless_customers() {
        let rows = vec![joined(1, None, None), joined(2, Some(20), None)];

        let trees = assemble_joined(rows);

        assert_eq!(trees.len(), 2);
        assert!(trees[0].orders.is_empty());
        assert_eq!(trees[1].orders.len(), 1);
        assert!(trees[1].orders[0].products.is_empty());
    }

    #[test]
    fn test_stitch_trees_matches_joined_shape() {
        let customers = vec![customer(1), customer(2)];
        let orders = vec![
            Order {
                id: 10,
                order_date: OffsetDateTime::UNIX_EPOCH,
                customer_id: 1,
            },
            Order {
                id: 11,
                order_date: OffsetDateTime::UNIX_EPOCH,
                customer_id: 2,
            },
        ];
        let products = vec![
            Product {
                id: 100,
                name: "Product A".to_string(),
                price: Decimal::from(20),
                order_id: 10,
            },
            Product {
                id: 101,
                name: "Product B".to_string(),
                price: Decimal::from(30),
                order_id: 10,
            },
            Product {
                id: 102,
                name: "Product A".to_string(),
                price: Decimal::from(40),
                order_id: 11,
            },
            Product {
                id: 103,
                name: "Product B".to_string(),
                price: Decimal::from(50),
                order_id: 11,
            },
        ];

        let stitched = stitch_trees(customers, orders, products);
        let joined_trees = assemble_joined(vec![
            joined(1, Some(10), Some((100, "Product A", 20))),
            joined(1, Some(10), Some((101, "Product B", 30))),
            joined(2, Some(11), Some((102, "Product A", 40))),
            joined(2, Some(11), Some((103, "Product B", 50))),
        ]);

        assert_eq!(stitched, joined_trees);
    }

    #[test]
    fn test_stitch_trees_drops_orphans() {
        let orders = vec![Order {
            id: 99,
            order_date: OffsetDateTime::UNIX_EPOCH,
            customer_id: 42,
        }];

        let trees = stitch_trees(vec![customer(1)], orders, Vec::new());

        assert_eq!(trees.len(), 1);
        assert!(trees[0].orders.is_empty());
    }
}
