use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// The three persisted entity kinds, in ownership order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Order,
    Product,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Customer, EntityKind::Order, EntityKind::Product];

    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Customer => "customers",
            EntityKind::Order => "orders",
            EntityKind::Product => "products",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "Active",
            CustomerStatus::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub balance: i32,
    pub status: String,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub region: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: String,
    pub fax: String,
    pub fax_number: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub order_date: OffsetDateTime,
    pub customer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub order_id: i64,
}

/// A customer that has not been persisted yet, together with the orders it owns.
///
/// Ids and foreign keys are absent: the store assigns them when the owning
/// batch is inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub age: i32,
    pub balance: i32,
    pub status: CustomerStatus,
    pub gender: Gender,
    pub address: String,
    pub city: String,
    pub country: String,
    pub region: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: String,
    pub fax: String,
    pub fax_number: String,
    pub email: String,
    pub orders: Vec<NewOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_date: OffsetDateTime,
    pub products: Vec<NewProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
}

/// A customer loaded together with its whole ownership tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerWithOrders {
    pub customer: Customer,
    pub orders: Vec<OrderWithProducts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithProducts {
    pub order: Order,
    pub products: Vec<Product>,
}

/// Flat projection of an order and the name of the customer who placed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderWithCustomer {
    pub id: i64,
    pub order_date: OffsetDateTime,
    pub customer_id: i64,
    pub customer_name: String,
}
