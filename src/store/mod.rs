pub mod store_model;
pub mod portfolio_store;

#[cfg(test)]
mod portfolio_store_tests;

pub use portfolio_store::*;
pub use store_model::*;
