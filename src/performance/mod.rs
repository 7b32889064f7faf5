pub mod performance_model;
pub mod performance_cache;

pub use performance_model::*;
pub use performance_cache::*;
