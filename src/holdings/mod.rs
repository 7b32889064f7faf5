pub mod holdings_model;
pub mod holdings_repository;
pub mod summary_aggregator;

pub use holdings_model::*;
pub use holdings_repository::*;
pub use summary_aggregator::*;
