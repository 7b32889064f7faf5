use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::allocation::allocation_model::{SectorAllocation, UNKNOWN_SECTOR};
use crate::constants::DECIMAL_PRECISION;
use crate::holdings::holdings_model::Holding;

/// Groups current value by sector, sorted by value descending.
///
/// Holdings without a sector are grouped under [`UNKNOWN_SECTOR`].
/// Percentages are relative to total current value and are zero for an
/// empty or zero-valued portfolio.
pub fn sector_allocations(holdings: &[Holding]) -> Vec<SectorAllocation> {
    let mut by_sector: HashMap<String, Decimal> = HashMap::new();
    for holding in holdings {
        let sector = holding
            .sector
            .clone()
            .unwrap_or_else(|| UNKNOWN_SECTOR.to_string());
        *by_sector.entry(sector).or_insert(Decimal::ZERO) += holding.current_value;
    }

    let total: Decimal = by_sector.values().copied().sum();

    let mut allocations: Vec<SectorAllocation> = by_sector
        .into_iter()
        .map(|(sector, value)| {
            let percentage = if total.is_zero() {
                Decimal::ZERO
            } else {
                (value / total * dec!(100)).round_dp(DECIMAL_PRECISION)
            };
            SectorAllocation {
                sector,
                value,
                percentage,
            }
        })
        .collect();

    // Deterministic order: value descending, then name
    allocations.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.sector.cmp(&b.sector)));
    allocations
}
