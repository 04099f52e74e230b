//! Customer/order/product schema and the query workloads benchmarked against it.

pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod strategies;

pub use config::BenchConfig;
pub use database::Database;
pub use errors::StoreError;
pub use models::{
    Customer, CustomerStatus, CustomerWithOrders, EntityKind, Gender, NewCustomer, NewOrder,
    NewProduct, Order, OrderWithCustomer, OrderWithProducts, Product,
};
pub use strategies::QueryStrategies;
