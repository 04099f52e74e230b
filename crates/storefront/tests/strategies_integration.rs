//! Integration tests for the query workloads.
//!
//! To run these tests, you need a PostgreSQL database and the DATABASE_URL
//! environment variable set:
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p storefront --test strategies_integration`
//!
//! Note: the test recreates the storefront tables, so point it at a scratch
//! database. Everything runs inside one test function because the workloads
//! share the same tables.

use std::env;

use rust_decimal::Decimal;
use storefront::pagination::PaginationQuery;
use storefront::{
    BenchConfig, CustomerStatus, Database, EntityKind, Gender, NewCustomer, NewOrder, NewProduct,
    QueryStrategies,
};
use time::{Duration, OffsetDateTime};

/// Get a database handle, skipping tests if DATABASE_URL is not set.
async fn get_test_db() -> Option<Database> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    match Database::connect(&database_url, 2).await {
        Ok(db) => Some(db),
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            None
        }
    }
}

fn new_customer(i: usize) -> NewCustomer {
    let order_date = OffsetDateTime::now_utc() - Duration::days(i as i64 % 1000);
    NewCustomer {
        name: format!("Customer {i}"),
        age: 30,
        balance: 500,
        status: if i % 2 == 0 {
            CustomerStatus::Active
        } else {
            CustomerStatus::Inactive
        },
        gender: if i % 2 == 0 { Gender::Male } else { Gender::Female },
        address: format!("Address {i}"),
        city: format!("City {}", i % 100),
        country: format!("Country {}", i % 50),
        region: format!("Region {}", i % 20),
        postal_code: format!("PC{}", i % 1000),
        country_code: format!("C{}", i % 50),
        phone: format!("555-010{}", i % 10),
        fax: format!("555-020{}", i % 10),
        fax_number: format!("555-030{}", i % 10),
        email: format!("test@customer{i}.com"),
        orders: vec![NewOrder {
            order_date,
            products: vec![
                NewProduct {
                    name: "Product A".to_string(),
                    price: Decimal::from(10 + (i % 490) as i64),
                },
                NewProduct {
                    name: "Product B".to_string(),
                    price: Decimal::from(499),
                },
            ],
        }],
    }
}

#[tokio::test]
async fn test_query_strategies_agree() {
    let Some(db) = get_test_db().await else {
        return;
    };

    db.reset().await.expect("Failed to reset schema");

    let customers: Vec<NewCustomer> = (0..120).map(new_customer).collect();
    db.insert_customer_batch(&customers[..100])
        .await
        .expect("Failed to insert first batch");
    db.insert_customer_batch(&customers[100..])
        .await
        .expect("Failed to insert second batch");

    assert_eq!(db.count(EntityKind::Customer).await.unwrap(), 120);
    assert_eq!(db.count(EntityKind::Order).await.unwrap(), 120);
    assert_eq!(db.count(EntityKind::Product).await.unwrap(), 240);

    let strategies = QueryStrategies::with_config(
        db.clone(),
        BenchConfig {
            take: 50,
            probe_id: 60,
        },
    );

    // Reads
    assert_eq!(strategies.fetch_customers_read_only().await.unwrap().len(), 50);
    assert_eq!(strategies.fetch_customers_for_update().await.unwrap().len(), 50);

    // Counting and existence agree between client and server side
    assert_eq!(strategies.count_customers_client_side().await.unwrap(), 120);
    assert_eq!(strategies.count_customers_server_side().await.unwrap(), 120);
    assert!(strategies.customer_exists_client_side().await.unwrap());
    assert!(strategies.customer_exists_server_side().await.unwrap());

    // Eager loading strategies build identical trees
    let joined = strategies.eager_load_joined().await.unwrap();
    let split = strategies.eager_load_split().await.unwrap();
    assert_eq!(joined.len(), 50);
    assert_eq!(joined, split);
    for tree in &joined {
        assert_eq!(tree.orders.len(), 1);
        assert_eq!(tree.orders[0].order.customer_id, tree.customer.id);
        assert_eq!(tree.orders[0].products.len(), 2);
        for product in &tree.orders[0].products {
            assert_eq!(product.order_id, tree.orders[0].order.id);
        }
    }

    let projected = strategies.orders_with_customer().await.unwrap();
    assert_eq!(projected.len(), 50);
    assert!(projected.iter().all(|o| o.customer_name.starts_with("Customer ")));

    // Offset and keyset pagination walk the same rows
    let offset_page = strategies
        .customers_page_offset(PaginationQuery::page(1, 25))
        .await
        .unwrap();
    assert_eq!(offset_page.total_count, 120);
    assert!(offset_page.has_more());

    let first = strategies.customers_page_keyset(None, 25).await.unwrap();
    let second = strategies
        .customers_page_keyset(first.next_after, 25)
        .await
        .unwrap();
    let offset_ids: Vec<i64> = offset_page.items.iter().map(|c| c.id).collect();
    let keyset_ids: Vec<i64> = second.items.iter().map(|c| c.id).collect();
    assert_eq!(offset_ids, keyset_ids);

    // Writes
    assert_eq!(
        strategies.rename_customers_per_row("Renamed").await.unwrap(),
        120
    );
    assert_eq!(
        strategies
            .rename_customers_set_based("Updated Name")
            .await
            .unwrap(),
        120
    );

    assert_eq!(strategies.delete_probe_customer().await.unwrap(), 1);
    assert!(!strategies.customer_exists_server_side().await.unwrap());
    assert_eq!(db.count(EntityKind::Customer).await.unwrap(), 119);
    assert_eq!(db.count(EntityKind::Order).await.unwrap(), 119);
    assert_eq!(db.count(EntityKind::Product).await.unwrap(), 238);

    db.clear_all().await.expect("Failed to clear tables");
    assert!(!db.exists(EntityKind::Customer).await.unwrap());
}
