//! Remote portfolio gateway: the REST contract and its wire payloads.
//!
//! The gateway is an external collaborator; this module defines the trait
//! the store depends on plus the payload shapes the reference backend
//! serves. `http_gateway` implements the trait over reqwest.

pub mod http_gateway;

pub use http_gateway::HttpPortfolioGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::holdings::holdings_model::{Exchange, Holding, HoldingInput, HoldingPatch};
use crate::performance::performance_model::PerformancePoint;

/// Asynchronous client for the remote portfolio service.
///
/// `create_holding` may return `Ok(None)` when the backend accepts the
/// holding but supplies no market data (the reference backend has no write
/// endpoints); the store then completes the holding from its quote
/// provider.
#[async_trait]
pub trait PortfolioGateway: Send + Sync {
    async fn get_portfolio(&self) -> Result<PortfolioPayload>;

    async fn get_performance(&self) -> Result<PerformancePayload>;

    async fn create_holding(&self, input: &HoldingInput) -> Result<Option<HoldingRecord>>;

    async fn update_holding(&self, id: &str, patch: &HoldingPatch) -> Result<()>;

    async fn delete_holding(&self, id: &str) -> Result<()>;
}

/// Response body of `GET /portfolio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPayload {
    pub holdings: Vec<HoldingRecord>,
    /// Backend-computed summary; informational only, the store recomputes
    /// the summary from the holding set.
    #[serde(default)]
    pub summary: Option<SummaryRecord>,
}

/// Response body of `GET /portfolio/performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePayload {
    pub historical_value: Vec<PerformancePoint>,
}

/// A holding as served by the backend. Ids may be numeric or string;
/// market data fields may be absent for freshly created holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRecord {
    #[serde(default, deserialize_with = "flexible_id::deserialize")]
    pub id: Option<String>,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<Exchange>,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub day_change_percent: Option<Decimal>,
}

impl HoldingRecord {
    /// Converts the wire record into a domain holding, filling defaults for
    /// missing market data and recomputing derived values. `fallback_id` is
    /// used when the backend did not assign one.
    pub fn into_holding(self, fallback_id: String) -> Holding {
        let current_price = self.current_price.unwrap_or(self.avg_cost);
        let day_change_percent = self.day_change_percent.unwrap_or(Decimal::ZERO);
        Holding::from_input(
            self.id.unwrap_or(fallback_id),
            HoldingInput {
                symbol: self.symbol,
                name: self.name,
                exchange: self.exchange.unwrap_or_default(),
                quantity: self.quantity,
                avg_cost: self.avg_cost,
                sector: self.sector,
                current_price: None,
                day_change_percent: None,
            },
            current_price,
            day_change_percent,
        )
    }
}

/// Backend summary block; parsed for completeness and used only to log
/// discrepancies against the locally recomputed summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub total_value: Decimal,
    pub total_investment: Decimal,
    #[serde(default)]
    pub day_change: Option<Decimal>,
    #[serde(default)]
    pub day_change_percent: Option<Decimal>,
    #[serde(default)]
    pub overall_gain: Option<Decimal>,
    #[serde(default)]
    pub overall_gain_percent: Option<Decimal>,
}

/// Accepts backend ids that arrive as JSON numbers or strings.
mod flexible_id {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "invalid holding id: {}",
                other
            ))),
        }
    }
}
