//! Pluggable pricing source for holdings the backend returns no market
//! data for. Production wires a real quote feed; demo mode uses the
//! simulated provider; tests inject a deterministic fake.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;

use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::Result;

/// A point-in-time quote for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: Decimal,
    pub day_change_percent: Decimal,
}

/// Source of market quotes. `reference_price` is the user's average cost,
/// used by providers that can only estimate around it.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str, reference_price: Decimal) -> Result<Quote>;
}

/// Demo-mode provider: jitters the price within ±10% of the reference and
/// the day change within ±2%, matching the reference backend's simulation.
#[derive(Debug, Default, Clone)]
pub struct SimulatedQuoteProvider;

impl SimulatedQuoteProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuoteProvider for SimulatedQuoteProvider {
    async fn quote(&self, _symbol: &str, reference_price: Decimal) -> Result<Quote> {
        let mut rng = rand::thread_rng();
        // Jitter in basis points keeps the arithmetic in Decimal
        let price_jitter = Decimal::new(rng.gen_range(-1000..=1000), 4);
        let day_change_percent = Decimal::new(rng.gen_range(-200..=200), 2);

        let price = (reference_price * (Decimal::ONE + price_jitter))
            .round_dp(DISPLAY_DECIMAL_PRECISION);

        Ok(Quote {
            price,
            day_change_percent,
        })
    }
}
