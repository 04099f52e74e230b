use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::models::{EntityKind, NewCustomer, NewOrder, NewProduct};

/// Postgres caps a single statement at this many bind parameters.
const BIND_LIMIT: usize = 65_535;

const CUSTOMER_COLUMNS: usize = 16;
const ORDER_COLUMNS: usize = 3;
const PRODUCT_COLUMNS: usize = 4;

fn rows_per_statement(columns: usize) -> usize {
    BIND_LIMIT / columns
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`, failing fast if the server cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(StoreError::Unreachable)?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Drops every storefront table and recreates the schema from migrations.
    pub async fn reset(&self) -> Result<(), StoreError> {
        info!("Recreating storefront schema");

        sqlx::query("DROP TABLE IF EXISTS products, orders, customers, _sqlx_migrations CASCADE")
            .execute(&self.pool)
            .await?;

        self.migrate().await
    }

    pub async fn exists(&self, kind: EntityKind) -> Result<bool, StoreError> {
        let sql = match kind {
            EntityKind::Customer => "SELECT EXISTS(SELECT 1 FROM customers)",
            EntityKind::Order => "SELECT EXISTS(SELECT 1 FROM orders)",
            EntityKind::Product => "SELECT EXISTS(SELECT 1 FROM products)",
        };

        let exists: bool = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    pub async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let sql = match kind {
            EntityKind::Customer => "SELECT COUNT(*) FROM customers",
            EntityKind::Order => "SELECT COUNT(*) FROM orders",
            EntityKind::Product => "SELECT COUNT(*) FROM products",
        };

        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    /// Inserts customers with their orders and products in a single transaction.
    ///
    /// Ids are drawn from each table's identity sequence before the rows are
    /// written, so every foreign key points at the parent the child was built
    /// under. Either the whole batch commits or none of it does.
    pub async fn insert_customer_batch(&self, customers: &[NewCustomer]) -> Result<(), StoreError> {
        if customers.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let customer_ids = reserve_ids(&mut tx, EntityKind::Customer, customers.len()).await?;
        let customer_rows: Vec<(i64, &NewCustomer)> =
            customer_ids.into_iter().zip(customers).collect();

        let orders: Vec<(i64, &NewOrder)> = customer_rows
            .iter()
            .flat_map(|(customer_id, customer)| {
                customer.orders.iter().map(move |order| (*customer_id, order))
            })
            .collect();
        let order_ids = reserve_ids(&mut tx, EntityKind::Order, orders.len()).await?;
        let order_rows: Vec<(i64, i64, &NewOrder)> = order_ids
            .into_iter()
            .zip(orders)
            .map(|(order_id, (customer_id, order))| (order_id, customer_id, order))
            .collect();

        let products: Vec<(i64, &NewProduct)> = order_rows
            .iter()
            .flat_map(|(order_id, _, order)| {
                order.products.iter().map(move |product| (*order_id, product))
            })
            .collect();
        let product_ids = reserve_ids(&mut tx, EntityKind::Product, products.len()).await?;
        let product_rows: Vec<(i64, i64, &NewProduct)> = product_ids
            .into_iter()
            .zip(products)
            .map(|(product_id, (order_id, product))| (product_id, order_id, product))
            .collect();

        for chunk in customer_rows.chunks(rows_per_statement(CUSTOMER_COLUMNS)) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO customers (id, name, age, balance, status, gender, address, city, \
                 country, region, postal_code, country_code, phone, fax, fax_number, email) ",
            );
            builder.push_values(chunk, |mut row, (id, customer)| {
                row.push_bind(*id)
                    .push_bind(&customer.name)
                    .push_bind(customer.age)
                    .push_bind(customer.balance)
                    .push_bind(customer.status.as_str())
                    .push_bind(customer.gender.as_str())
                    .push_bind(&customer.address)
                    .push_bind(&customer.city)
                    .push_bind(&customer.country)
                    .push_bind(&customer.region)
                    .push_bind(&customer.postal_code)
                    .push_bind(&customer.country_code)
                    .push_bind(&customer.phone)
                    .push_bind(&customer.fax)
                    .push_bind(&customer.fax_number)
                    .push_bind(&customer.email);
            });
            builder.build().execute(&mut *tx).await?;
        }

        for chunk in order_rows.chunks(rows_per_statement(ORDER_COLUMNS)) {
            let mut builder =
                QueryBuilder::<Postgres>::new("INSERT INTO orders (id, order_date, customer_id) ");
            builder.push_values(chunk, |mut row, (id, customer_id, order)| {
                row.push_bind(*id)
                    .push_bind(order.order_date)
                    .push_bind(*customer_id);
            });
            builder.build().execute(&mut *tx).await?;
        }

        for chunk in product_rows.chunks(rows_per_statement(PRODUCT_COLUMNS)) {
            let mut builder =
                QueryBuilder::<Postgres>::new("INSERT INTO products (id, name, price, order_id) ");
            builder.push_values(chunk, |mut row, (id, order_id, product)| {
                row.push_bind(*id)
                    .push_bind(&product.name)
                    .push_bind(product.price)
                    .push_bind(*order_id);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        debug!(
            customers = customer_rows.len(),
            orders = order_rows.len(),
            products = product_rows.len(),
            "Committed customer batch"
        );

        Ok(())
    }

    /// Removes every customer, order and product and restarts the id sequences.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        info!("Clearing storefront tables");

        sqlx::query("TRUNCATE products, orders, customers RESTART IDENTITY")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Draws `n` fresh ids from the identity sequence backing `kind`.
async fn reserve_ids(
    conn: &mut PgConnection,
    kind: EntityKind,
    n: usize,
) -> Result<Vec<i64>, StoreError> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT nextval(pg_get_serial_sequence($1, 'id')) FROM generate_series(1, $2)",
    )
    .bind(kind.table_name())
    .bind(n as i64)
    .fetch_all(&mut *conn)
    .await?;

    if ids.len() != n {
        return Err(StoreError::IdReservation {
            kind,
            expected: n,
            got: ids.len(),
        });
    }

    Ok(ids)
}
