//! Customer generation with nested orders and products.

use std::ops::Range;

use rand::Rng;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use storefront::{CustomerStatus, Gender, NewCustomer, NewOrder, NewProduct};

/// Ages are drawn uniformly from this range.
pub const AGE_RANGE: Range<i32> = 18..80;

/// Balances are drawn uniformly from this range.
pub const BALANCE_RANGE: Range<i32> = 0..10_000;

/// Product prices are whole amounts drawn from this range.
pub const PRICE_RANGE: Range<i64> = 10..500;

/// Orders are dated up to this many days before the run started.
pub const ORDER_WINDOW_DAYS: i64 = 1000;

/// Names of the products placed on every order, in order.
pub const PRODUCT_NAMES: [&str; 2] = ["Product A", "Product B"];

/// Builds customers whose descriptive fields are derived from their index.
///
/// Age, balance, order date and prices are random; everything else is a pure
/// function of the index.
#[derive(Debug, Clone, Copy)]
pub struct CustomerGenerator {
    started_at: OffsetDateTime,
}

impl CustomerGenerator {
    /// Creates a generator dating orders relative to `started_at`.
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self { started_at }
    }

    /// Generates customer `index` with one order of two products.
    pub fn generate(&self, index: usize, rng: &mut impl Rng) -> NewCustomer {
        let even = index % 2 == 0;

        NewCustomer {
            name: format!("Customer {index}"),
            age: rng.gen_range(AGE_RANGE),
            balance: rng.gen_range(BALANCE_RANGE),
            status: if even {
                CustomerStatus::Active
            } else {
                CustomerStatus::Inactive
            },
            gender: if even { Gender::Male } else { Gender::Female },
            address: format!("Address {index}"),
            city: format!("City {}", index % 100),
            country: format!("Country {}", index % 50),
            region: format!("Region {}", index % 20),
            postal_code: format!("PC{}", index % 1000),
            country_code: format!("C{}", index % 50),
            phone: format!("555-010{}", index % 10),
            fax: format!("555-020{}", index % 10),
            fax_number: format!("555-030{}", index % 10),
            email: format!("test@customer{index}.com"),
            orders: vec![self.generate_order(rng)],
        }
    }

    fn generate_order(&self, rng: &mut impl Rng) -> NewOrder {
        let days_ago = rng.gen_range(0..ORDER_WINDOW_DAYS);

        NewOrder {
            order_date: self.started_at - Duration::days(days_ago),
            products: PRODUCT_NAMES
                .iter()
                .map(|name| NewProduct {
                    name: (*name).to_string(),
                    price: Decimal::from(rng.gen_range(PRICE_RANGE)),
                })
                .collect(),
        }
    }
}
