//! Entity generators for seed data.
//!
//! - [`CustomerGenerator`]: builds a customer with its single order and two products

pub mod customer;

pub use customer::CustomerGenerator;
