use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;
use crate::errors::ValidationError;

const PERCENT: Decimal = dec!(100);

/// Exchange the instrument is listed on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nse,
    Bse,
}

impl Default for Exchange {
    fn default() -> Self {
        Exchange::Nse
    }
}

/// A single stock position within the portfolio.
///
/// `invested_amount` and `current_value` are derived and are recomputed by
/// the repository on every mutation; callers never set them directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub exchange: Exchange,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub current_price: Decimal,
    pub sector: Option<String>,
    pub day_change_percent: Decimal,

    // Derived valuation, kept in sync by the repository
    pub invested_amount: Decimal,
    pub current_value: Decimal,
}

impl Holding {
    /// Builds a holding from validated input plus market data.
    pub fn from_input(
        id: String,
        input: HoldingInput,
        current_price: Decimal,
        day_change_percent: Decimal,
    ) -> Self {
        let mut holding = Holding {
            id,
            symbol: input.symbol,
            name: input.name,
            exchange: input.exchange,
            quantity: input.quantity,
            avg_cost: input.avg_cost,
            current_price,
            sector: input.sector,
            day_change_percent,
            invested_amount: Decimal::ZERO,
            current_value: Decimal::ZERO,
        };
        holding.refresh_derived();
        holding
    }

    /// Recomputes `invested_amount` and `current_value` from the stored
    /// quantity, cost, and price.
    pub fn refresh_derived(&mut self) {
        self.invested_amount = (self.quantity * self.avg_cost).round_dp(DECIMAL_PRECISION);
        self.current_value = (self.quantity * self.current_price).round_dp(DECIMAL_PRECISION);
    }

    /// Absolute day change contributed by this position.
    pub fn day_change(&self) -> Decimal {
        (self.current_value * self.day_change_percent / PERCENT).round_dp(DECIMAL_PRECISION)
    }

    pub fn overall_profit(&self) -> Decimal {
        self.current_value - self.invested_amount
    }

    /// Profit relative to the invested amount; zero when nothing is invested.
    pub fn overall_profit_percent(&self) -> Decimal {
        if self.invested_amount.is_zero() {
            Decimal::ZERO
        } else {
            (self.overall_profit() / self.invested_amount * PERCENT).round_dp(DECIMAL_PRECISION)
        }
    }

    /// Invariants for stored holdings. Looser than [`HoldingInput::validate`]
    /// on cost: fetched positions may carry a zero cost basis (bonus
    /// shares), only negative costs are rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        if self.avg_cost < Decimal::ZERO {
            return Err(ValidationError::NegativeCost(self.avg_cost));
        }
        if self.current_price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(self.current_price));
        }
        Ok(())
    }
}

/// User input for the add-holding command. Market data fields are optional;
/// when absent the store fills them from the quote provider.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HoldingInput {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Exchange,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub day_change_percent: Option<Decimal>,
}

impl HoldingInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        if self.avg_cost <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveCost(self.avg_cost));
        }
        if let Some(price) = self.current_price {
            if price < Decimal::ZERO {
                return Err(ValidationError::NegativePrice(price));
            }
        }
        Ok(())
    }
}

/// Explicit patch for the update-holding command. Only provided fields
/// change; each is validated before the merge.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub avg_cost: Option<Decimal>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub day_change_percent: Option<Decimal>,
}

impl HoldingPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sector.is_none()
            && self.quantity.is_none()
            && self.avg_cost.is_none()
            && self.current_price.is_none()
            && self.day_change_percent.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::InvalidInput(
                "Patch contains no fields".to_string(),
            ));
        }
        if let Some(quantity) = self.quantity {
            if quantity <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveQuantity(quantity));
            }
        }
        if let Some(avg_cost) = self.avg_cost {
            if avg_cost <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveCost(avg_cost));
            }
        }
        if let Some(price) = self.current_price {
            if price < Decimal::ZERO {
                return Err(ValidationError::NegativePrice(price));
            }
        }
        Ok(())
    }

    /// Applies the provided fields onto a holding and refreshes its derived
    /// valuation.
    pub fn apply_to(&self, holding: &mut Holding) {
        if let Some(name) = &self.name {
            holding.name = name.clone();
        }
        if let Some(sector) = &self.sector {
            holding.sector = Some(sector.clone());
        }
        if let Some(quantity) = self.quantity {
            holding.quantity = quantity;
        }
        if let Some(avg_cost) = self.avg_cost {
            holding.avg_cost = avg_cost;
        }
        if let Some(price) = self.current_price {
            holding.current_price = price;
        }
        if let Some(day_change_percent) = self.day_change_percent {
            holding.day_change_percent = day_change_percent;
        }
        holding.refresh_derived();
    }
}

/// Aggregate portfolio-level metrics derived from all holdings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_investment: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
    pub overall_gain: Decimal,
    pub overall_gain_percent: Decimal,
}

impl PortfolioSummary {
    pub fn zero() -> Self {
        PortfolioSummary {
            total_value: Decimal::ZERO,
            total_investment: Decimal::ZERO,
            day_change: Decimal::ZERO,
            day_change_percent: Decimal::ZERO,
            overall_gain: Decimal::ZERO,
            overall_gain_percent: Decimal::ZERO,
        }
    }
}

impl Default for PortfolioSummary {
    fn default() -> Self {
        Self::zero()
    }
}
