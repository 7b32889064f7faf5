//! Allocation models for portfolio breakdown by sector.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bucket for holdings without a sector classification.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Allocation of current portfolio value to a single sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorAllocation {
    /// Sector name, or [`UNKNOWN_SECTOR`] when unclassified
    pub sector: String,
    /// Total current value held in this sector
    pub value: Decimal,
    /// Percentage of total portfolio value (0-100)
    pub percentage: Decimal,
}
