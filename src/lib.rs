//! Nivesh Core - Portfolio state management for an equities dashboard.
//!
//! This crate maintains a consistent view of a user's holdings and derived
//! summary metrics, synchronized with a remote portfolio service. It is
//! backend-agnostic: the HTTP gateway and the quote source are traits that
//! are injected into the [`store::PortfolioStore`].

pub mod allocation;
pub mod constants;
pub mod errors;
pub mod gateway;
pub mod holdings;
pub mod performance;
pub mod quotes;
pub mod store;

// Re-export common types from the holdings and store modules
pub use holdings::*;
pub use performance::{PerformanceCache, PerformancePoint, RangeLabel, RangeMetrics};
pub use store::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
